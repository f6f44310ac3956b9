//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verified identity attributes decoded from a Firebase ID token.
///
/// Owned by the identity provider; never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// User profile stored in Firestore (document ID is the Firebase UID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    /// Only changed through the profile-update path
    #[serde(default)]
    pub phone: String,
    /// Only changed through the profile-update path
    #[serde(default)]
    pub birth_date: String,
    /// Set once on creation
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    /// Build a first-login document; both timestamps are `now`.
    pub fn new(user: &NewUser, now: DateTime<Utc>) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
            phone: String::new(),
            birth_date: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a login refresh. A `None` photo keeps the stored one.
    pub fn apply_login(&mut self, update: &LoginUpdate, now: DateTime<Utc>) {
        self.name = update.name.clone();
        self.email = update.email.clone();
        if let Some(photo) = &update.photo_url {
            self.photo_url = Some(photo.clone());
        }
        self.updated_at = now;
    }

    /// Merge explicitly edited profile fields.
    pub fn apply_profile(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(phone) = &update.phone {
            self.phone = phone.clone();
        }
        if let Some(birth_date) = &update.birth_date {
            self.birth_date = birth_date.clone();
        }
        if let Some(photo) = &update.photo_url {
            self.photo_url = Some(photo.clone());
        }
        self.updated_at = now;
    }
}

/// Fields written when a user document is first created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

/// Fields refreshed on every login.
#[derive(Debug, Clone)]
pub struct LoginUpdate {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

/// Profile edits submitted by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.birth_date.is_none()
            && self.photo_url.is_none()
    }

    /// Firestore field paths touched by this update, `updatedAt` included.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::with_capacity(5);
        if self.name.is_some() {
            paths.push("name");
        }
        if self.phone.is_some() {
            paths.push("phone");
        }
        if self.birth_date.is_some() {
            paths.push("birthDate");
        }
        if self.photo_url.is_some() {
            paths.push("photoURL");
        }
        paths.push("updatedAt");
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> UserDocument {
        UserDocument::new(
            &NewUser {
                name: "Old".to_string(),
                email: "old@example.com".to_string(),
                photo_url: Some("https://example.com/old.png".to_string()),
            },
            now,
        )
    }

    #[test]
    fn test_serialized_field_names() {
        let doc = sample(Utc::now());
        let value = serde_json::to_value(&doc).unwrap();
        for key in [
            "name",
            "email",
            "photoURL",
            "phone",
            "birthDate",
            "createdAt",
            "updatedAt",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_login_keeps_photo_when_none() {
        let created = Utc::now();
        let mut doc = sample(created);
        doc.phone = "0100000000".to_string();

        let later = created + chrono::Duration::seconds(5);
        doc.apply_login(
            &LoginUpdate {
                name: "New".to_string(),
                email: "new@example.com".to_string(),
                photo_url: None,
            },
            later,
        );

        assert_eq!(doc.name, "New");
        assert_eq!(doc.photo_url.as_deref(), Some("https://example.com/old.png"));
        assert_eq!(doc.phone, "0100000000");
        assert_eq!(doc.created_at, created);
        assert_eq!(doc.updated_at, later);
    }

    #[test]
    fn test_profile_field_paths() {
        let update = ProfileUpdate {
            phone: Some("0100000000".to_string()),
            ..Default::default()
        };
        assert_eq!(update.field_paths(), vec!["phone", "updatedAt"]);
        assert!(ProfileUpdate::default().is_empty());
    }
}
