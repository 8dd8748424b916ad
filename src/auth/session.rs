//! JWT session token creation and verification.

use anyhow::{anyhow, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::account;
use serde::{Deserialize, Serialize};

/// How long an issued session stays valid.
const SESSION_TTL_HOURS: i64 = 24;

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account id)
    pub sub: i32,
    /// Login email
    pub email: String,
    /// Admin flag
    pub is_superuser: bool,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
}

impl SessionClaims {
    /// Create new session claims for an account
    pub fn new(account: &account::Model) -> Self {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(SESSION_TTL_HOURS);

        Self {
            sub: account.id,
            email: account.email.clone(),
            is_superuser: account.is_superuser,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Create a session token for an authenticated account
pub fn create_session_token(account: &account::Model, secret_key: &str) -> Result<String> {
    let claims = SessionClaims::new(account);
    let key = EncodingKey::from_secret(secret_key.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| anyhow!("create session token: {e}"))
}

/// Verify and decode a session token.
///
/// Any failure (bad signature, expiry, malformed token) yields None; the
/// caller turns that into an unauthenticated response.
pub fn verify_session_token(token: &str, secret_key: &str) -> Option<SessionClaims> {
    let key = DecodingKey::from_secret(secret_key.as_bytes());
    let validation = Validation::default();

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .ok()
}
