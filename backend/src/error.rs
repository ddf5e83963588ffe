use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by the auth handlers.
///
/// Token failures of every kind (malformed, expired, wrong purpose, stale
/// password version, unknown user) map to the single `InvalidOrExpiredToken`
/// variant so the response never tells them apart.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Access denied")]
    Forbidden,

    /// `context` is the only text sent to the caller; `source` is logged.
    #[error("{context}")]
    Unexpected {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AuthError {
    pub fn unexpected(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        AuthError::Unexpected {
            context,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Unexpected { context, source } = &self {
            tracing::error!("{context}: {source:#}");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
