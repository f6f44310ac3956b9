// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Firebase settings are optional: without a project ID the server still
//! starts, and routes that need the server-side clients answer 503 so the
//! frontend falls back to the client SDK.

use std::env;

/// Default Identity Toolkit REST endpoint.
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Firebase/GCP project ID. `None` means degraded mode.
    pub firebase_project_id: Option<String>,
    /// Web API key used for Identity Toolkit REST calls
    pub firebase_api_key: Option<String>,
    /// Administrator email addresses (exact match)
    pub admin_emails: Vec<String>,
    /// Identity Toolkit base URL (overridable for the auth emulator)
    pub identity_toolkit_url: String,
    /// Keep documents in process memory instead of Firestore
    pub use_memory_store: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            firebase_project_id: non_empty_var("FIREBASE_PROJECT_ID"),
            firebase_api_key: non_empty_var("FIREBASE_API_KEY"),
            admin_emails: parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            identity_toolkit_url: non_empty_var("IDENTITY_TOOLKIT_URL")
                .unwrap_or_else(|| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
            use_memory_store: env::var("USE_MEMORY_STORE")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Config for tests: a configured project with one administrator.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            firebase_project_id: Some("test-project".to_string()),
            firebase_api_key: Some("test-api-key".to_string()),
            admin_emails: vec!["admin@example.com".to_string()],
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            use_memory_store: true,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated list of addresses. Entries are trimmed but
/// otherwise kept verbatim; matching against them is case-sensitive.
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_emails() {
        assert_eq!(
            parse_admin_emails(" admin@example.com , ,Teacher@Example.com,"),
            vec!["admin@example.com", "Teacher@Example.com"]
        );
        assert!(parse_admin_emails("").is_empty());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_PROJECT_ID", "tutor-site");
        env::set_var("ADMIN_EMAILS", "admin@example.com");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_project_id.as_deref(), Some("tutor-site"));
        assert_eq!(config.admin_emails, vec!["admin@example.com"]);
        assert_eq!(config.port, 8080);
    }
}
