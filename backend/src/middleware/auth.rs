//! Bearer-token authentication for protected routes.
//!
//! Handlers take `AuthenticatedUser` as an extractor. Role-restricted routes
//! (warden and admin management) call `require_role` on it before doing work.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    error::AuthError,
    models::{auth::AuthenticatedUser, user::UserRole},
    services::tokens::TokenCodec,
    AppState,
};

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Unauthorized("Missing Authorization header"))?;

        authenticate(auth_header, state.auth.tokens())
    }
}

/// Resolve the identity behind an `Authorization: Bearer <token>` header value.
/// Refresh and password-reset tokens are refused here.
pub fn authenticate(auth_header: &str, tokens: &TokenCodec) -> Result<AuthenticatedUser, AuthError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthorized("Invalid Authorization header format"))?;

    tokens
        .verify_access(token)
        .map(AuthenticatedUser::from)
        .ok_or(AuthError::Unauthorized("Invalid or expired token"))
}

impl AuthenticatedUser {
    /// 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AuthError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}
