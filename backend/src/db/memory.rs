//! In-memory `UserStore` for unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::users::UserStore;
use crate::models::user::{NewUser, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    students: Mutex<HashMap<Uuid, Uuid>>,
    fail: Mutex<bool>,
    concurrent_write: Mutex<Option<String>>,
}

impl MemoryUserStore {
    /// Links a student profile to an existing user and returns its id.
    pub fn add_student_profile(&self, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.students.lock().unwrap().insert(user_id, id);
        id
    }

    pub fn password_hash_of(&self, user_id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|u| u.password_hash.clone())
    }

    /// The next `replace_password_hash` first sees `hash` written by another
    /// party, as if a concurrent reset had landed between read and write.
    pub fn interleave_password_write(&self, hash: String) {
        *self.concurrent_write.lock().unwrap() = Some(hash);
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    fn check(&self) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn student_id_for(&self, user_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        self.check()?;
        Ok(self.students.lock().unwrap().get(&user_id).copied())
    }

    async fn replace_password_hash(
        &self,
        user_id: Uuid,
        current_hash: &str,
        new_hash: &str,
    ) -> anyhow::Result<bool> {
        self.check()?;
        let interleaved = self.concurrent_write.lock().unwrap().take();
        let mut users = self.users.lock().unwrap();
        if let (Some(hash), Some(user)) = (interleaved, users.get_mut(&user_id)) {
            user.password_hash = hash;
        }
        match users.get_mut(&user_id) {
            Some(user) if user.password_hash == current_hash => {
                user.password_hash = new_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
        self.check()?;
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.to_string(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            can_access_dashboard: user.can_access_dashboard,
            created_at: now,
            updated_at: now,
        };
        self.users
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.check()
    }
}
