//! Session token issuer.
//!
//! Stateless HS256 JWTs: the account ID and an expiry, signed with a
//! server-held secret. Expiry is the only invalidation mechanism; there is
//! no revocation list.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teslaverse_core::UserId;

/// How long an issued session token stays valid.
pub const SESSION_VALIDITY_DAYS: i64 = 7;

/// Errors from session token operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Bad signature, malformed token, or expired.
    #[error("invalid session token")]
    InvalidToken,

    /// Signing failed (should not happen with a valid secret).
    #[error("failed to sign session token")]
    Signing,
}

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account ID.
    sub: i32,
    /// Issued at (unix seconds).
    iat: i64,
    /// Expiration (unix seconds).
    exp: i64,
    /// Unique token ID.
    jti: String,
}

/// Stateless signer and validator for bearer session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionIssuer {
    /// Create an issuer from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for the given account, valid for seven days.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, SessionError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: UserId, now: i64) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user_id.as_i32(),
            iat: now,
            exp: now + Duration::days(SESSION_VALIDITY_DAYS).num_seconds(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| SessionError::Signing)
    }

    /// Validate a token and extract the account ID.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidToken` for bad signatures, malformed
    /// tokens, or expired tokens.
    pub fn validate(&self, token: &str) -> Result<UserId, SessionError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| SessionError::InvalidToken)?;

        Ok(UserId::new(data.claims.sub))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(&SecretString::from("k9#mQ2$vX7!pL4@wN8%rT3^bF6&hJ1*z"))
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let issuer = issuer();
        let token = issuer.issue(UserId::new(42)).unwrap();
        assert_eq!(issuer.validate(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let mut token = issuer.issue(UserId::new(1)).unwrap();
        token.push('x');
        assert!(matches!(
            issuer.validate(&token),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let issuer = issuer();
        assert!(issuer.validate("not-a-jwt").is_err());
        assert!(issuer.validate("").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer().issue(UserId::new(1)).unwrap();
        let other = SessionIssuer::new(&SecretString::from("z1*jH6&fB3^tR8%nW4@lP7!xV2$qM9#k"));
        assert!(matches!(
            other.validate(&token),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        // Issued eight days ago: past the 7-day validity plus leeway
        let past = Utc::now().timestamp() - Duration::days(8).num_seconds();
        let token = issuer.issue_at(UserId::new(1), past).unwrap();
        assert!(matches!(
            issuer.validate(&token),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_tokens_are_unique_per_issuance() {
        let issuer = issuer();
        let a = issuer.issue(UserId::new(1)).unwrap();
        let b = issuer.issue(UserId::new(1)).unwrap();
        // jti differs even when issued within the same second
        assert_ne!(a, b);
    }
}
