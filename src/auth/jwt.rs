use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: Uuid,
    #[serde(rename = "emailId")]
    pub email_id: String,
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The identity fields a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email_id: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email_id: user.email_id.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("JWT encode failed: {0}")]
    Signing(String),
}

/// Issues and verifies HS256 bearer tokens with a fixed secret and lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let claims = Claims {
            id: identity.id,
            email_id: identity.email_id.clone(),
            sub: identity.id,
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-that-is-long-enough", Duration::hours(1))
    }

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::now_v7(),
            email_id: "jane@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let svc = service();
        let who = identity(Role::Admin);
        let token = svc.issue(&who).unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.id, who.id);
        assert_eq!(claims.sub, who.id);
        assert_eq!(claims.email_id, who.email_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let token = svc
            .issue_at(&identity(Role::User), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn unrepresentable_expiry_is_a_signing_error() {
        let svc = TokenService::new("test-secret-that-is-long-enough", Duration::minutes(1_000_000_000_000));
        let err = svc.issue(&identity(Role::User)).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let svc = service();
        let token = svc.issue(&identity(Role::User)).unwrap();

        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{unsigned}.{flipped}{}", &signature[1..]);
        assert_eq!(svc.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let svc = service();
        let user_token = svc.issue(&identity(Role::User)).unwrap();
        let admin_token = svc.issue(&identity(Role::Admin)).unwrap();

        // Splice the admin payload under the user token's signature.
        let parts: Vec<&str> = user_token.split('.').collect();
        let admin_payload = admin_token.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.{}", parts[0], admin_payload, parts[2]);
        assert_eq!(svc.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn other_secret_and_garbage_are_invalid() {
        let token = service().issue(&identity(Role::User)).unwrap();
        let other = TokenService::new("a-completely-different-secret", Duration::hours(1));
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
        assert_eq!(service().verify("not.a.token"), Err(TokenError::Invalid));
        assert_eq!(service().verify(""), Err(TokenError::Invalid));
    }
}
