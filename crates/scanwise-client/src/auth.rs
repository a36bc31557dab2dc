//! # Auth Context
//!
//! Holds the bearer token used for every analysis request. The context is
//! created by the application and handed to the client; nothing reads a
//! token from global state.
//!
//! ## Token Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bearer Token Flow                               │
//! │                                                                         │
//! │  set_token(jwt) ──► decode `exp` (signature NOT checked) ──► TokenInfo │
//! │                                                                         │
//! │  bearer()                                                               │
//! │    ├── no token            ──► ClientError::NotAuthenticated            │
//! │    ├── exp in the past     ──► ClientError::TokenExpired                │
//! │    └── otherwise           ──► "eyJ..." for the Authorization header    │
//! │                                                                         │
//! │  Opaque (non-JWT) tokens are accepted with an unknown expiry; the       │
//! │  service remains the authority and answers 401 when it disagrees.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

/// Token information derived when a token is set.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// The raw bearer token.
    pub access_token: String,
    /// Expiry from the JWT `exp` claim, when the token carries one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// Inspects `token` for an expiry.
    pub fn parse(token: impl Into<String>) -> Self {
        let access_token = token.into();
        let expires_at = read_expiry(&access_token);
        Self {
            access_token,
            expires_at,
        }
    }

    /// True once the expiry has passed. Tokens without one never expire here.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Seconds until expiry, if known.
    pub fn remaining_secs(&self) -> Option<i64> {
        self.expires_at
            .map(|exp| (exp - Utc::now()).num_seconds().max(0))
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

fn read_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data
            .claims
            .exp
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Err(e) => {
            debug!(error = %e, "Token is not a readable JWT; expiry unknown");
            None
        }
    }
}

/// Shared holder of the current bearer token.
///
/// Cheap to clone; clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Arc<RwLock<Option<TokenInfo>>>,
}

impl AuthContext {
    /// Creates a context with no token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(TokenInfo::parse(token)))),
        }
    }

    /// Creates a context from an optional configured token.
    pub fn from_optional(token: Option<&str>) -> Self {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Self::with_token(t),
            None => Self::new(),
        }
    }

    /// Replaces the current token.
    pub async fn set_token(&self, token: impl Into<String>) {
        let info = TokenInfo::parse(token);
        info!(expires_at = ?info.expires_at, "Auth token set");
        *self.token.write().await = Some(info);
    }

    /// Forgets the current token.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn token_info(&self) -> Option<TokenInfo> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired())
    }

    /// The token to send, or why none can be sent.
    pub async fn bearer(&self) -> ClientResult<String> {
        let guard = self.token.read().await;
        let token = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        if token.is_expired() {
            return Err(ClientError::TokenExpired);
        }

        if let Some(remaining) = token.remaining_secs() {
            debug!(remaining_secs = remaining, "Using bearer token");
        }
        Ok(token.access_token.clone())
    }
}
