use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{
        auth::{AccessClaims, PasswordResetClaims, RefreshClaims, TokenKind},
        user::UserRole,
    },
    services::password::password_version,
};

pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const PASSWORD_RESET_TTL: Duration = Duration::from_secs(15 * 60);

/// Claims plus the registered timestamps added at signing.
#[derive(Debug, Serialize, Deserialize)]
struct Signed<T> {
    #[serde(flatten)]
    claims: T,
    iat: u64,
    exp: u64,
}

/// HS256 signer/verifier for every token the API hands out.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue<T: Serialize>(&self, claims: &T, ttl: Duration) -> anyhow::Result<String> {
        let now = now_secs();
        let signed = Signed {
            claims,
            iat: now,
            exp: now + ttl.as_secs(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &signed, &self.encoding_key)?;
        Ok(token)
    }

    /// Returns the claims of a token whose signature checks out and whose
    /// expiry lies strictly in the future. Any other input yields `None`.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Signed<T>>(token, &self.decoding_key, &validation).ok()?;
        if data.claims.exp <= now_secs() {
            return None;
        }
        Some(data.claims.claims)
    }

    pub fn issue_access(&self, id: Uuid, email: &str, role: UserRole) -> anyhow::Result<String> {
        let claims = AccessClaims {
            id,
            email: email.to_string(),
            role,
            kind: None,
        };
        self.issue(&claims, ACCESS_TOKEN_TTL)
    }

    pub fn issue_refresh(&self, id: Uuid) -> anyhow::Result<String> {
        let claims = RefreshClaims {
            id,
            kind: TokenKind::Refresh,
        };
        self.issue(&claims, REFRESH_TOKEN_TTL)
    }

    /// Reset token bound to the given stored hash through its password version.
    pub fn issue_password_reset(&self, id: Uuid, password_hash: &str) -> anyhow::Result<String> {
        let claims = PasswordResetClaims {
            id,
            kind: TokenKind::PasswordReset,
            password_version: password_version(password_hash),
        };
        self.issue(&claims, PASSWORD_RESET_TTL)
    }

    /// Tokens with any `type` claim are not access tokens.
    pub fn verify_access(&self, token: &str) -> Option<AccessClaims> {
        self.verify::<AccessClaims>(token)
            .filter(|claims| claims.kind.is_none())
    }

    pub fn verify_password_reset(&self, token: &str) -> Option<PasswordResetClaims> {
        self.verify::<PasswordResetClaims>(token).filter(|claims| {
            claims.kind == TokenKind::PasswordReset && !claims.password_version.is_empty()
        })
    }
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET)
    }

    #[test]
    fn access_token_round_trips() {
        let id = Uuid::new_v4();
        let token = codec()
            .issue_access(id, "student@example.com", UserRole::Student)
            .unwrap();

        let claims = codec().verify_access(&token).unwrap();
        assert_eq!(
            claims,
            AccessClaims {
                id,
                email: "student@example.com".into(),
                role: UserRole::Student,
                kind: None,
            }
        );
    }

    #[test]
    fn refresh_token_carries_its_discriminator() {
        let id = Uuid::new_v4();
        let token = codec().issue_refresh(id).unwrap();

        let claims: RefreshClaims = codec().verify(&token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(codec().verify_access(&token).is_none());
        assert!(codec().verify_password_reset(&token).is_none());
    }

    #[test]
    fn zero_ttl_is_already_expired() {
        let claims = RefreshClaims {
            id: Uuid::new_v4(),
            kind: TokenKind::Refresh,
        };
        let token = codec().issue(&claims, Duration::ZERO).unwrap();
        assert!(codec().verify::<RefreshClaims>(&token).is_none());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenCodec::new(b"another-secret-key-that-is-32-bytes-long!");
        let token = other
            .issue_access(Uuid::new_v4(), "warden@example.com", UserRole::Warden)
            .unwrap();
        assert!(codec().verify_access(&token).is_none());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = codec()
            .issue_access(Uuid::new_v4(), "student@example.com", UserRole::Student)
            .unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = codec()
            .issue_access(Uuid::new_v4(), "student@example.com", UserRole::Admin)
            .unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();

        assert!(codec().verify_access(&parts.join(".")).is_none());
    }

    #[test]
    fn garbage_is_rejected_without_panicking() {
        assert!(codec().verify_access("").is_none());
        assert!(codec().verify_access("not.a.jwt").is_none());
        assert!(codec().verify_password_reset("abc").is_none());
    }

    #[test]
    fn reset_token_embeds_the_password_version() {
        let id = Uuid::new_v4();
        let token = codec().issue_password_reset(id, "$2b$04$storedhash").unwrap();

        let claims = codec().verify_password_reset(&token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.kind, TokenKind::PasswordReset);
        assert_eq!(claims.password_version, password_version("$2b$04$storedhash"));
    }

    #[test]
    fn access_token_is_not_a_reset_token_and_vice_versa() {
        let id = Uuid::new_v4();
        let access = codec()
            .issue_access(id, "student@example.com", UserRole::Student)
            .unwrap();
        let reset = codec().issue_password_reset(id, "$2b$04$storedhash").unwrap();

        assert!(codec().verify_password_reset(&access).is_none());
        assert!(codec().verify_access(&reset).is_none());
    }

    #[test]
    fn reset_claims_with_wrong_discriminator_are_rejected() {
        let forged = PasswordResetClaims {
            id: Uuid::new_v4(),
            kind: TokenKind::Refresh,
            password_version: "v".into(),
        };
        let token = codec().issue(&forged, PASSWORD_RESET_TTL).unwrap();
        assert!(codec().verify_password_reset(&token).is_none());
    }
}
