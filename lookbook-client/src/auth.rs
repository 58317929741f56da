//! Admin sign-in
//!
//! The dashboard is gated by an email/password sign-in against an identity
//! provider. [`AuthProvider`] is the seam; [`PasswordAuth`] talks to an
//! identity-toolkit compatible REST endpoint, [`MemoryAuth`] serves tests and
//! local runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::ClientConfig;

/// Sign-in failure taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredential,

    #[error("no account for this email")]
    AccountNotFound,

    #[error("malformed email address")]
    MalformedIdentifier,

    #[error("sign-in unavailable: {0}")]
    Transport(String),
}

impl AuthError {
    /// Map a provider error code (`"INVALID_PASSWORD"`,
    /// `"TOO_MANY_ATTEMPTS_TRY_LATER : ..."`) to the taxonomy
    pub fn from_code(code: &str) -> Self {
        let code = code.split(" : ").next().unwrap_or(code).trim();
        match code {
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
                Self::InvalidCredential
            }
            "EMAIL_NOT_FOUND" => Self::AccountNotFound,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::MalformedIdentifier,
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Email + password pair
#[derive(Clone)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Client-side shape check before any network call
    pub fn check(&self) -> Result<(), AuthError> {
        if !is_email_shaped(self.email.trim()) {
            return Err(AuthError::MalformedIdentifier);
        }
        if self.password.is_empty() {
            return Err(AuthError::InvalidCredential);
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// `local@domain.tld`, no whitespace
fn is_email_shaped(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Signed-in admin session
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Identity provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, credential: &Credential) -> Result<Session, AuthError>;
}

// ============================================================================
// Password sign-in over REST
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: Option<String>,
    /// Seconds, as a string
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Identity-toolkit `accounts:signInWithPassword`
#[derive(Debug, Clone)]
pub struct PasswordAuth {
    client: reqwest::Client,
    auth_url: String,
    api_key: String,
}

impl PasswordAuth {
    pub fn new(config: &ClientConfig) -> crate::ClientResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| crate::ClientError::Config("LOOKBOOK_API_KEY is not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/accounts:signInWithPassword", self.auth_url)
    }
}

#[async_trait]
impl AuthProvider for PasswordAuth {
    async fn sign_in(&self, credential: &Credential) -> Result<Session, AuthError> {
        credential.check()?;

        let body = SignInRequest {
            email: credential.email.trim(),
            password: &credential.password,
            return_secure_token: true,
        };
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| AuthError::from_code(&envelope.error.message))
                .unwrap_or_else(|_| AuthError::Transport(format!("HTTP {status}")));
            tracing::warn!(email = %credential.email, "Sign-in rejected: {err}");
            return Err(err);
        }

        let data: SignInResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Transport(e.to_string()))?;
        let expires_at = expiry_from(data.expires_in.as_deref(), Utc::now());

        tracing::info!(uid = %data.local_id, "Admin signed in");
        Ok(Session {
            uid: data.local_id,
            email: data.email,
            id_token: data.id_token,
            refresh_token: data.refresh_token,
            expires_at,
        })
    }
}

/// Absolute expiry from an `expiresIn` seconds string
///
/// Unparseable or out-of-range values mean no known expiry.
fn expiry_from(expires_in: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let secs = expires_in?.trim().parse::<i64>().ok()?;
    let ttl = Duration::try_seconds(secs)?;
    now.checked_add_signed(ttl)
}

// ============================================================================
// In-memory accounts
// ============================================================================

/// Fixed account table
#[derive(Debug, Default, Clone)]
pub struct MemoryAuth {
    /// email -> password
    accounts: HashMap<String, String>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts
            .insert(email.into().to_lowercase(), password.into());
        self
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(&self, credential: &Credential) -> Result<Session, AuthError> {
        credential.check()?;
        let email = credential.email.trim().to_lowercase();
        let password = self
            .accounts
            .get(&email)
            .ok_or(AuthError::AccountNotFound)?;
        if *password != credential.password {
            return Err(AuthError::InvalidCredential);
        }
        Ok(Session {
            uid: format!("local-{email}"),
            email,
            id_token: format!("memory-token-{}", Utc::now().timestamp_millis()),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::from_code("INVALID_PASSWORD"), AuthError::InvalidCredential);
        assert_eq!(AuthError::from_code("INVALID_LOGIN_CREDENTIALS"), AuthError::InvalidCredential);
        assert_eq!(AuthError::from_code("EMAIL_NOT_FOUND"), AuthError::AccountNotFound);
        assert_eq!(AuthError::from_code("INVALID_EMAIL"), AuthError::MalformedIdentifier);
        assert_eq!(
            AuthError::from_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            AuthError::Transport("TOO_MANY_ATTEMPTS_TRY_LATER".to_string())
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email_shaped("admin@shop.example"));
        assert!(!is_email_shaped("admin"));
        assert!(!is_email_shaped("admin@shop"));
        assert!(!is_email_shaped("@shop.example"));
        assert!(!is_email_shaped("ad min@shop.example"));
        assert!(!is_email_shaped("a@b@shop.example"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credential = Credential::new("admin@shop.example", "hunter2");
        assert!(!format!("{credential:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_memory_auth() {
        let auth = MemoryAuth::new().with_account("Admin@Shop.example", "secret");

        let session = auth
            .sign_in(&Credential::new("admin@shop.example", "secret"))
            .await
            .unwrap();
        assert_eq!(session.email, "admin@shop.example");
        assert!(!session.is_expired());

        assert_eq!(
            auth.sign_in(&Credential::new("admin@shop.example", "wrong")).await.unwrap_err(),
            AuthError::InvalidCredential
        );
        assert_eq!(
            auth.sign_in(&Credential::new("nobody@shop.example", "secret")).await.unwrap_err(),
            AuthError::AccountNotFound
        );
        assert_eq!(
            auth.sign_in(&Credential::new("not-an-email", "secret")).await.unwrap_err(),
            AuthError::MalformedIdentifier
        );
    }

    #[test]
    fn test_expiry_from_server_value() {
        let now = Utc::now();
        assert_eq!(expiry_from(Some("3600"), now), Some(now + Duration::hours(1)));
        assert_eq!(expiry_from(Some("soon"), now), None);
        assert_eq!(expiry_from(None, now), None);
        assert_eq!(expiry_from(Some(&i64::MAX.to_string()), now), None);
        assert_eq!(expiry_from(Some("9000000000000000"), now), None);
    }

    #[test]
    fn test_password_auth_requires_api_key() {
        let err = PasswordAuth::new(&ClientConfig::default()).unwrap_err();
        assert!(matches!(err, crate::ClientError::Config(_)));
    }
}
