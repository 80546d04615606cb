//! Access token claim decoding.
//!
//! The client never verifies signatures; it only reads the payload segment of
//! the JWT to learn who the token belongs to and when it expires. The server
//! remains the authority on whether a token is acceptable.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::User;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried in the access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    /// Expiration time (Unix timestamp)
    #[serde(deserialize_with = "timestamp")]
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub iat: Option<i64>,
}

/// NumericDate may carry a fractional part; whole seconds are kept.
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() {
        return Err(serde::de::Error::custom("timestamp out of range"));
    }
    Ok(secs.floor() as i64)
}

fn optional_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<f64>::deserialize(deserializer)? {
        Some(secs) if secs.is_finite() => Ok(Some(secs.floor() as i64)),
        Some(_) => Err(serde::de::Error::custom("timestamp out of range")),
        None => Ok(None),
    }
}

impl AccessClaims {
    /// Decode the payload segment of a JWT without verifying its signature.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(TokenError::Malformed("expected three segments".to_string())),
        };

        // Some issuers pad the segments even though the JWT format forbids it
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| TokenError::Malformed(format!("invalid base64 payload: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::Malformed(format!("invalid claims: {}", e)))
    }

    /// A token is expired once the current second reaches `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Seconds left before expiry, negative once expired.
    pub fn seconds_until_expiry(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }

    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            username: self.username.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    /// Mint an HS256 token whose `exp` is `offset_secs` away from now.
    pub fn token_expiring_in(offset_secs: i64, user_id: i64, username: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = json!({
            "token_type": "access",
            "user_id": user_id,
            "username": username,
            "iat": now - 60,
            "exp": now + offset_secs,
        });
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
            .expect("failed to encode test token")
    }

    pub fn valid_token(user_id: i64, username: &str) -> String {
        token_expiring_in(3600, user_id, username)
    }

    pub fn expired_token(user_id: i64, username: &str) -> String {
        token_expiring_in(-100, user_id, username)
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;

    #[test]
    fn decodes_subject_and_expiry() {
        let token = valid_token(7, "ana");
        let claims = AccessClaims::decode(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "ana");
        assert!(!claims.is_expired());
        assert!(claims.iat.is_some());
        assert_eq!(claims.user(), User { id: 7, username: "ana".to_string() });
    }

    #[test]
    fn detects_expired_token() {
        let claims = AccessClaims::decode(&expired_token(7, "ana")).unwrap();
        assert!(claims.is_expired());
        assert!(claims.seconds_until_expiry() < 0);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let claims = AccessClaims { user_id: 1, username: "a".into(), exp: 1000, iat: None };
        assert!(!claims.is_expired_at(999));
        assert!(claims.is_expired_at(1000));
        assert!(claims.is_expired_at(1001));
    }

    #[test]
    fn rejects_garbage() {
        assert!(AccessClaims::decode("not-a-jwt").is_err());
        assert!(AccessClaims::decode("a.b").is_err());
        assert!(AccessClaims::decode("a.b.c.d").is_err());
        assert!(AccessClaims::decode("aaa.!!!.ccc").is_err());
    }

    #[test]
    fn rejects_payload_without_expiry() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"user_id":3,"username":"x"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload);
        assert!(matches!(AccessClaims::decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn fractional_timestamps_are_floored() {
        let payload = URL_SAFE_NO_PAD
            .encode(br#"{"user_id":3,"username":"xy","exp":1700000000.5,"iat":1699999000.9}"#);
        let claims = AccessClaims::decode(&format!("h.{}.s", payload)).unwrap();
        assert_eq!(claims.exp, 1_700_000_000);
        assert_eq!(claims.iat, Some(1_699_999_000));
    }

    #[test]
    fn tolerates_padded_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE
            .encode(br#"{"user_id":3,"username":"xy","exp":99}"#);
        let token = format!("h.{}.s", payload);
        let claims = AccessClaims::decode(&token).unwrap();
        assert_eq!(claims.exp, 99);
        assert_eq!(claims.iat, None);
    }
}
