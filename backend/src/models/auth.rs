use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Purpose discriminator carried in the `type` claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Refresh,
    PasswordReset,
}

/// Claims embedded in the access token. Access tokens never carry a `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,
}

/// Claims embedded in the refresh token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshClaims {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Claims embedded in a password-reset token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PasswordResetClaims {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Fingerprint of the password hash at issuance.
    #[serde(rename = "passwordVersion")]
    pub password_version: String,
}

/// Extracted from a validated access token, available via Axum extractors
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<AccessClaims> for AuthenticatedUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}
