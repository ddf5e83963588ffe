use std::env;

/// Shortest signing secret accepted at startup (HS256 key size).
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// Public origin of the web app, used to build password-reset links.
    pub app_base_url: String,
    pub production: bool,
    pub bcrypt_cost: u32,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|s| !s.is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| anyhow::anyhow!("Missing required env var: {}", key))
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes long");
        }

        let app_base_url = optional("APP_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&app_base_url)
            .map_err(|e| anyhow::anyhow!("Invalid APP_BASE_URL {app_base_url:?}: {e}"))?;

        let bcrypt_cost: u32 = optional("BCRYPT_COST")
            .unwrap_or_else(|| "10".into())
            .parse()?;
        if !(4..=31).contains(&bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: optional("PORT").unwrap_or_else(|| "8080".into()).parse()?,
            app_base_url,
            production: optional("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            bcrypt_cost,
            smtp_host: optional("SMTP_HOST"),
            smtp_port: optional("SMTP_PORT").and_then(|v| v.parse().ok()),
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            smtp_from: optional("SMTP_FROM"),
        })
    }
}
