pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Authenticated identity attached to a request after token verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: String,
    pub is_privileged: bool,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, is_privileged: bool) -> Self {
        Self {
            subject_id: subject_id.into(),
            is_privileged,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn new(principal: &Principal, issued_at: DateTime<Utc>, expiry_hours: Option<u64>) -> Self {
        Self {
            username: principal.subject_id.clone(),
            is_admin: principal.is_privileged,
            iat: issued_at.timestamp(),
            exp: expiry_hours.map(|h| (issued_at + Duration::hours(h as i64)).timestamp()),
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.username,
            is_privileged: claims.is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token signing secret is not configured")]
    Configuration,

    #[error("token generation error: {0}")]
    TokenGeneration(String),
}

/// Issues and verifies stateless HS256 identity tokens.
///
/// There is no revocation list; a token stays valid until the secret changes
/// or, when `token_expiry_hours` is configured, until it expires.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    expiry_hours: Option<u64>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expiry_hours", &self.expiry_hours)
            .finish()
    }
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiry_hours: config.token_expiry_hours,
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_at(principal, Utc::now())
    }

    /// Same principal and issuance time always produce the same token.
    pub fn issue_at(&self, principal: &Principal, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let secret = self.secret()?;
        let claims = Claims::new(principal, issued_at, self.expiry_hours);
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let secret = self.secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = self.expiry_hours.is_some();
        if validation.validate_exp {
            validation.set_required_spec_claims(&["exp"]);
        }

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        Ok(token_data.claims.into())
    }

    fn secret(&self) -> Result<&str, AuthError> {
        self.secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::Configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: Option<&str>, expiry_hours: Option<u64>) -> TokenService {
        TokenService::new(&SecurityConfig {
            enable_cors: false,
            cors_origins: vec![],
            jwt_secret: secret.map(str::to_string),
            token_expiry_hours: expiry_hours,
            bcrypt_cost: 4,
        })
    }

    #[test]
    fn round_trip_preserves_principal() {
        let tokens = service(Some("secret"), None);
        for principal in [Principal::new("santa", true), Principal::new("elf", false)] {
            let token = tokens.issue(&principal).unwrap();
            assert_eq!(tokens.verify(&token).unwrap(), principal);
        }
    }

    #[test]
    fn issuance_is_deterministic_for_a_fixed_time() {
        let tokens = service(Some("secret"), None);
        let at = Utc::now();
        let principal = Principal::new("santa", false);
        assert_eq!(
            tokens.issue_at(&principal, at).unwrap(),
            tokens.issue_at(&principal, at).unwrap()
        );
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let tokens = service(None, None);
        assert_eq!(
            tokens.issue(&Principal::new("santa", false)),
            Err(AuthError::Configuration)
        );
        assert_eq!(service(Some(""), None).verify("x.y.z"), Err(AuthError::Configuration));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = service(Some("secret"), None);
        let theirs = service(Some("other-secret"), None);
        let token = theirs.issue(&Principal::new("santa", true)).unwrap();
        assert_eq!(ours.verify(&token), Err(AuthError::InvalidToken));
        assert_eq!(ours.verify("not-a-token"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = service(Some("secret"), None);
        let token = tokens.issue(&Principal::new("elf", false)).unwrap();
        let forged = tokens.issue(&Principal::new("elf", true)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged.split('.').nth(1).unwrap();
        assert_eq!(tokens.verify(&parts.join(".")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expiry_only_enforced_when_configured() {
        let long_ago = Utc::now() - Duration::days(365);
        let principal = Principal::new("santa", false);

        let lenient = service(Some("secret"), None);
        let old = lenient.issue_at(&principal, long_ago).unwrap();
        assert_eq!(lenient.verify(&old).unwrap(), principal);

        let strict = service(Some("secret"), Some(1));
        let expired = strict.issue_at(&principal, long_ago).unwrap();
        assert_eq!(strict.verify(&expired), Err(AuthError::InvalidToken));
        // a token minted without exp does not satisfy an expiry policy
        assert_eq!(strict.verify(&old), Err(AuthError::InvalidToken));
        let fresh = strict.issue(&principal).unwrap();
        assert_eq!(strict.verify(&fresh).unwrap(), principal);
    }
}
