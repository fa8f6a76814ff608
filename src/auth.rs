//! Bearer-token authentication.
//!
//! The note server only depends on the [`Authenticator`] trait. The shipped
//! implementation verifies HMAC-SHA256 signed tokens of the form
//! `base64url(owner).issued_at.signature`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::models::OwnerId;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed clock drift for tokens issued "in the future" (5 minutes).
const MAX_TIMESTAMP_DRIFT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
}

/// Resolves a bearer token to the verified owner it was issued for.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<OwnerId, AuthError>;
}

/// Verifies tokens signed with a shared secret.
pub struct SignedTokenAuthenticator {
    secret: String,
    max_age: Duration,
}

impl SignedTokenAuthenticator {
    pub fn new(secret: impl Into<String>, max_age: Duration) -> Self {
        Self {
            secret: secret.into(),
            max_age,
        }
    }

    /// Issue a token for `owner`, valid from now.
    pub fn issue(&self, owner: &OwnerId) -> String {
        self.issue_at(owner, current_timestamp())
    }

    fn issue_at(&self, owner: &OwnerId, issued_at: u64) -> String {
        let subject = URL_SAFE_NO_PAD.encode(owner.as_str());
        let payload = format!("{}.{}", subject, issued_at);
        let signature = compute_signature(&self.secret, payload.as_bytes());
        format!("{}.{}", payload, signature)
    }
}

impl Authenticator for SignedTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<OwnerId, AuthError> {
        let mut parts = token.trim().splitn(3, '.');
        let (Some(subject), Some(issued_at), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let payload = format!("{}.{}", subject, issued_at);
        let expected = compute_signature(&self.secret, payload.as_bytes());
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(AuthError::InvalidToken);
        }

        let issued_at: u64 = issued_at.parse().map_err(|_| AuthError::InvalidToken)?;
        let now = current_timestamp();
        if issued_at > now + MAX_TIMESTAMP_DRIFT_SECS {
            return Err(AuthError::InvalidToken);
        }
        if now.saturating_sub(issued_at) > self.max_age.as_secs() {
            return Err(AuthError::Expired);
        }

        let owner = URL_SAFE_NO_PAD
            .decode(subject)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|s| OwnerId::parse(&s))
            .ok_or(AuthError::InvalidToken)?;

        Ok(owner)
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`.
fn compute_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generate a random shared secret.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
