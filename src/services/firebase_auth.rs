// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client.
//!
//! Verifies Firebase ID tokens against Google's published signing keys and
//! calls the Identity Toolkit REST API for account creation and
//! email/password sign-in.

use crate::config::Config;
use crate::error::AppError;
use crate::models::IdentityClaims;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity provider error categories.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The token is missing, malformed, expired or signed by someone else.
    #[error("invalid ID token: {0}")]
    InvalidToken(String),
    /// Email/password sign-in was refused.
    #[error("sign-in rejected: {0}")]
    Credentials(String),
    /// The provider refused the request (e.g. `EMAIL_EXISTS`).
    #[error("request rejected: {0}")]
    Rejected(String),
    /// REST calls need a web API key that was not configured.
    #[error("Identity Toolkit API key is not configured")]
    MissingApiKey,
    /// A transient infrastructure failure occurred.
    #[error("identity provider unreachable: {0}")]
    Transient(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(msg) => AppError::InvalidToken(msg),
            AuthError::Credentials(msg) => AppError::InvalidToken(msg),
            AuthError::Rejected(msg) => AppError::BadRequest(msg),
            AuthError::MissingApiKey => AppError::not_configured(),
            AuthError::Transient(msg) => AppError::IdentityProvider(msg),
        }
    }
}

/// Account returned by the Identity Toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Result of a successful email/password sign-in.
#[derive(Debug, Clone)]
pub struct PasswordSignIn {
    pub uid: String,
    pub id_token: String,
}

#[derive(Clone)]
enum VerifierMode {
    Google,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Firebase Authentication client for one project.
pub struct FirebaseAuth {
    http_client: reqwest::Client,
    project_id: String,
    expected_issuer: String,
    api_key: Option<String>,
    identity_toolkit_url: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseAuth {
    /// Create a production client that fetches and caches Google's keys.
    pub fn new(project_id: &str, config: &Config) -> anyhow::Result<Self> {
        let client = Self::build(project_id, config, VerifierMode::Google)?;

        tracing::info!(
            project = %client.project_id,
            issuer = %client.expected_issuer,
            rest_enabled = client.api_key.is_some(),
            "Initialized Firebase Auth client"
        );

        Ok(client)
    }

    /// Create a client that verifies tokens with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        project_id: &str,
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key kid must not be empty");
        }

        Self::build(
            project_id,
            config,
            VerifierMode::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(project_id: &str, config: &Config, mode: VerifierMode) -> anyhow::Result<Self> {
        if project_id.trim().is_empty() {
            anyhow::bail!("Firebase project ID must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Firebase Auth HTTP client")?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            expected_issuer: format!("https://securetoken.google.com/{}", project_id),
            api_key: config.firebase_api_key.clone(),
            identity_toolkit_url: config.identity_toolkit_url.trim_end_matches('/').to_string(),
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    // ─── Token Verification ──────────────────────────────────────

    /// Verify a Firebase ID token and return its identity claims.
    pub async fn verify_id_token(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken("ID token is empty".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.expected_issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| AuthError::InvalidToken(format!("JWT validation failed: {e}")))?;

        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty sub claim".to_string()));
        }
        validate_not_future("iat", claims.iat)?;
        validate_not_future("auth_time", claims.auth_time)?;

        tracing::debug!(
            uid = %claims.sub,
            email = claims.email.as_deref().unwrap_or("<missing>"),
            "Verified Firebase ID token"
        );

        Ok(IdentityClaims {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        match &self.mode {
            VerifierMode::StaticKey {
                kid: static_kid,
                decoding_key,
            } => {
                if kid == static_kid {
                    return Ok(decoding_key.clone());
                }

                return Err(AuthError::InvalidToken(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )));
            }
            VerifierMode::Google => {}
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AuthError::InvalidToken(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = FIREBASE_JWKS_URL, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .map_err(|e| AuthError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);

        if keys_by_kid.is_empty() {
            return Err(AuthError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }

    // ─── Identity Toolkit REST ───────────────────────────────────

    /// Create an email/password account and set its display name.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserRecord, AuthError> {
        let signed_up: SignUpResponse = self
            .toolkit_call(
                "accounts:signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let updated: UpdateAccountResponse = self
            .toolkit_call(
                "accounts:update",
                &UpdateAccountRequest {
                    id_token: &signed_up.id_token,
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;

        tracing::info!(uid = %signed_up.local_id, "Created Firebase account");

        Ok(UserRecord {
            uid: signed_up.local_id,
            email: signed_up.email,
            display_name: updated.display_name,
        })
    }

    /// Sign in with email and password, returning a fresh ID token.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PasswordSignIn, AuthError> {
        let response: SignInResponse = self
            .toolkit_call(
                "accounts:signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await
            .map_err(|err| match err {
                AuthError::Rejected(code) if is_credential_error(&code) => {
                    AuthError::Credentials(code)
                }
                other => other,
            })?;

        Ok(PasswordSignIn {
            uid: response.local_id,
            id_token: response.id_token,
        })
    }

    async fn toolkit_call<B, R>(&self, method: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(AuthError::MissingApiKey)?;
        let url = format!("{}/{}", self.identity_toolkit_url, method);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transient(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::Transient(format!("invalid {method} response: {e}")));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ToolkitErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| format!("{method} returned status {status}"));

        if status.is_client_error() {
            tracing::info!(method, message = %message, "Identity Toolkit rejected request");
            Err(AuthError::Rejected(message))
        } else {
            Err(AuthError::Transient(message))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    iat: Option<usize>,
    auth_time: Option<usize>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountResponse {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ToolkitErrorBody {
    error: ToolkitError,
}

#[derive(Deserialize)]
struct ToolkitError {
    message: String,
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }

        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }

        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

fn is_credential_error(code: &str) -> bool {
    const CODES: [&str; 4] = [
        "INVALID_PASSWORD",
        "EMAIL_NOT_FOUND",
        "INVALID_LOGIN_CREDENTIALS",
        "USER_DISABLED",
    ];
    CODES.iter().any(|c| code.starts_with(c))
}

fn validate_not_future(claim: &str, value: Option<usize>) -> Result<(), AuthError> {
    let Some(value) = value else {
        return Err(AuthError::InvalidToken(format!("missing {claim} claim")));
    };

    if value as u64 > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(AuthError::InvalidToken(format!(
            "{claim} claim is in the future"
        )));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    let Some(max_age) = headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
    else {
        return fallback;
    };

    Duration::from_secs(max_age)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    for directive in value.split(',') {
        let directive = directive.trim();

        if let Some(raw) = directive.strip_prefix("max-age=") {
            let raw = raw.trim_matches('"');
            if let Ok(seconds) = raw.parse::<u64>() {
                return Some(seconds);
            }
        }
    }

    None
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=19302, must-revalidate"),
            Some(19302)
        );
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("no-store"), None);
        assert_eq!(parse_cache_control_max_age("max-age=soon"), None);
    }

    #[test]
    fn credential_error_codes() {
        assert!(is_credential_error("INVALID_LOGIN_CREDENTIALS"));
        assert!(is_credential_error("USER_DISABLED"));
        assert!(!is_credential_error("EMAIL_EXISTS"));
        assert!(!is_credential_error("WEAK_PASSWORD : Password should be at least 6 characters"));
    }

    #[test]
    fn future_claims_rejected() {
        let future = (now_unix_secs() + 3600) as usize;
        assert!(validate_not_future("iat", Some(future)).is_err());
        assert!(validate_not_future("iat", None).is_err());
        assert!(validate_not_future("iat", Some(now_unix_secs() as usize)).is_ok());
    }

    #[test]
    fn jwks_filtering() {
        let jwks: Jwks = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "ec", "kty": "EC", "n": "", "e": "" },
                { "kid": "enc", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" },
                { "kid": "", "kty": "RSA", "n": "AQAB", "e": "AQAB" }
            ]
        }))
        .unwrap();

        assert!(usable_keys(jwks).is_empty());
    }

    #[tokio::test]
    async fn empty_token_is_invalid() {
        let config = Config::test_default();
        let auth = FirebaseAuth::new("test-project", &config).unwrap();
        assert!(matches!(
            auth.verify_id_token("").await,
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            auth.verify_id_token("not-a-jwt").await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn rest_calls_need_api_key() {
        let config = Config {
            firebase_api_key: None,
            ..Config::test_default()
        };
        let auth = FirebaseAuth::new("test-project", &config).unwrap();
        let err = auth
            .sign_in_with_password("a@x.com", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingApiKey));
    }
}
