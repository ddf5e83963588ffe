use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, role, name, phone, can_access_dashboard, created_at, updated_at";

/// Persistent credential store used by the auth flows.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// `email` must already be normalized (trimmed, lowercase).
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Student profile linked to the given user, if any.
    async fn student_id_for(&self, user_id: Uuid) -> anyhow::Result<Option<Uuid>>;

    /// Replaces the password hash only while it still equals `current_hash`.
    /// Returns `false` when the record is gone or the hash moved on.
    async fn replace_password_hash(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
    ) -> anyhow::Result<bool>;

    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User>;

    async fn ping(&self) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn student_id_for(&self, user_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM students WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn replace_password_hash(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW()
             WHERE id = $2 AND password_hash = $3",
        )
        .bind(new_hash)
        .bind(user_id)
        .bind(current_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, role, name, phone, can_access_dashboard)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.can_access_dashboard)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
