use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Config,
    db::users::UserStore,
    error::AuthError,
    models::user::{
        ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse,
        MessageResponse, ResetPasswordRequest, User, UserProfile, UserRole,
    },
    services::{
        email::EmailService,
        password::{password_version, PasswordHasher},
        tokens::TokenCodec,
    },
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Length is counted in UTF-16 code units, as browser clients count it.
pub fn meets_min_password_length(password: &str) -> bool {
    password.encode_utf16().count() >= MIN_PASSWORD_LEN
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn build_reset_url(base_url: &str, token: &str) -> anyhow::Result<String> {
    let url = url::Url::parse_with_params(
        &format!("{}/auth/reset-password", base_url.trim_end_matches('/')),
        &[("token", token)],
    )?;
    Ok(url.into())
}

/// Login, forgot-password and reset-password over a `UserStore`.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenCodec,
    hasher: PasswordHasher,
    email: Option<Arc<EmailService>>,
    app_base_url: String,
    production: bool,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenCodec,
        hasher: PasswordHasher,
        email: Option<Arc<EmailService>>,
        app_base_url: impl Into<String>,
        production: bool,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            email,
            app_base_url: app_base_url.into(),
            production,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn UserStore>,
        email: Option<Arc<EmailService>>,
    ) -> Self {
        Self::new(
            store,
            TokenCodec::new(config.jwt_secret.as_bytes()),
            PasswordHasher::new(config.bcrypt_cost),
            email,
            config.app_base_url.clone(),
            config.production,
        )
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Verify credentials and issue an access/refresh pair.
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        const CONTEXT: &str = "Login failed";

        let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
        let password = req.password.as_deref().unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Email and password are required"));
        }

        let user = self
            .store
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let role: UserRole = user
            .role
            .parse()
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;

        let student = match role {
            UserRole::Student => self
                .store
                .student_id_for(user.id)
                .await
                .map_err(|e| AuthError::unexpected(CONTEXT, e))?,
            _ => None,
        };

        let token = self
            .tokens
            .issue_access(user.id, &user.email, role)
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;
        let refresh_token = self
            .tokens
            .issue_refresh(user.id)
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;

        tracing::info!("login succeeded for user_id={}", user.id);

        Ok(LoginResponse {
            success: true,
            user: UserProfile::try_from(user).map_err(|e| AuthError::unexpected(CONTEXT, e))?,
            student,
            token,
            refresh_token,
            message: "Login successful".to_string(),
        })
    }

    /// Issue a reset link for the account, if there is one.
    /// The response never reveals whether the email is registered.
    pub async fn request_password_reset(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, AuthError> {
        const CONTEXT: &str = "Failed to process forgot password request";

        let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required"));
        }

        let user = self
            .store
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;

        let Some(user) = user else {
            return Ok(ForgotPasswordResponse {
                success: true,
                message: FORGOT_PASSWORD_MESSAGE.to_string(),
                dev_reset_url: None,
            });
        };

        let token = self
            .tokens
            .issue_password_reset(user.id, &user.password_hash)
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;
        let reset_url = build_reset_url(&self.app_base_url, &token)
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;

        tracing::info!("password reset requested for user_id={}", user.id);
        self.deliver_reset_link(&user, &reset_url).await;

        Ok(ForgotPasswordResponse {
            success: true,
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
            dev_reset_url: (!self.production).then_some(reset_url),
        })
    }

    /// Send errors are logged and swallowed so the response stays identical.
    async fn deliver_reset_link(&self, user: &User, reset_url: &str) {
        match &self.email {
            Some(svc) => {
                if let Err(e) = svc
                    .send_password_reset(&user.email, &user.name, reset_url)
                    .await
                {
                    tracing::warn!("password reset email to user_id={} failed: {:#}", user.id, e);
                }
            }
            None if self.production => {
                tracing::warn!(
                    "SMTP not configured; password reset link for user_id={} was not delivered",
                    user.id
                );
            }
            None => {}
        }
    }

    /// Replace the password of the account named by a reset token.
    ///
    /// The token is only honoured while the stored hash still has the password
    /// version embedded in it. The write is conditional on that same hash, so
    /// a concurrent reset or password change makes this call fail.
    pub async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        const CONTEXT: &str = "Failed to reset password";

        let token = req.token.as_deref().map(str::trim).unwrap_or_default();
        let password = req.password.as_deref().unwrap_or_default();
        if token.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Token and new password are required"));
        }
        if !meets_min_password_length(password) {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters long",
            ));
        }

        let claims = self
            .tokens
            .verify_password_reset(token)
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let user = self
            .store
            .find_by_id(claims.id)
            .await
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if password_version(&user.password_hash) != claims.password_version {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let new_hash = self
            .hasher
            .hash(password)
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;

        let replaced = self
            .store
            .replace_password_hash(user.id, &user.password_hash, &new_hash)
            .await
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?;
        if !replaced {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        tracing::info!("password reset completed for user_id={}", user.id);

        Ok(MessageResponse {
            success: true,
            message: "Password reset successful".to_string(),
        })
    }

    /// Profile of the user behind a verified access token.
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        const CONTEXT: &str = "Failed to load user";

        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::unexpected(CONTEXT, e))?
            .ok_or(AuthError::Unauthorized("User no longer exists"))?;
        UserProfile::try_from(user).map_err(|e| AuthError::unexpected(CONTEXT, e))
    }
}
