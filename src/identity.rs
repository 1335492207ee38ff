use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;

/// IdentityError
///
/// Failure modes when talking to the hosted identity provider. `Rejected`
/// carries the provider's own refusal (duplicate email, weak password, bad
/// credentials); `Unavailable` covers transport and decoding failures.
#[derive(Debug, Clone)]
pub enum IdentityError {
    Rejected(String),
    Unavailable(String),
}

/// IdentityProvider Contract
///
/// Defines the abstract contract for the external identity service. The portal
/// never verifies credentials itself: passwords flow through these two calls
/// to the provider and are never persisted or logged locally. The trait allows
/// swapping the real HTTP client for the in-memory Mock during testing without
/// affecting the calling handlers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a new account with the provider and returns its canonical
    /// user id, which becomes the primary key of the mirrored local profile.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError>;

    /// Verifies credentials with the provider and returns the user id on
    /// success. Session issuance stays on our side.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Uuid, IdentityError>;
}

/// IdentityState
///
/// The concrete type used to share the identity client across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

// --- The Real Implementation (hosted provider over HTTP) ---

/// HostedIdentityClient
///
/// Talks to a Supabase-compatible auth gateway: `/auth/v1/signup` for
/// registration and the password grant of `/auth/v1/token` for login.
pub struct HostedIdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SignupResponse {
    id: Uuid,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: Uuid,
}

impl HostedIdentityClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.auth_url.clone(),
            api_key: config.auth_api_key.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            // Duplicate email, weak password, etc. The body is provider-defined;
            // we keep only the status for the client-facing message.
            return Err(IdentityError::Rejected(format!(
                "signup refused with status {}",
                response.status()
            )));
        }

        let body = response
            .json::<SignupResponse>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(body.id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Uuid, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected("invalid credentials".to_string()));
        }

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(body.user.id)
    }
}

// --- The Mock Implementation (For Tests) ---

/// MockIdentityProvider
///
/// In-memory stand-in for the hosted provider, used by unit and integration
/// tests. Accepts any credentials and mints a fresh id on signup, or returns
/// a fixed id / simulated failure when configured to.
pub struct MockIdentityProvider {
    pub known_user: Option<(String, Uuid)>,
    pub should_fail: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            known_user: None,
            should_fail: false,
        }
    }

    pub fn with_user(email: &str, id: Uuid) -> Self {
        Self {
            known_user: Some((email.to_string(), id)),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            known_user: None,
            should_fail: true,
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Uuid, IdentityError> {
        if self.should_fail {
            return Err(IdentityError::Rejected("simulated signup refusal".to_string()));
        }
        Ok(Uuid::new_v4())
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<Uuid, IdentityError> {
        if self.should_fail {
            return Err(IdentityError::Rejected("invalid credentials".to_string()));
        }
        match &self.known_user {
            Some((known_email, id)) if known_email == email => Ok(*id),
            _ => Err(IdentityError::Rejected("invalid credentials".to_string())),
        }
    }
}
