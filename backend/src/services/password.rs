use sha2::{Digest, Sha256};

/// bcrypt hashing with a fresh salt per call.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// A stored hash bcrypt cannot parse never verifies.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("bcrypt verify failed on stored hash: {}", e);
                false
            }
        }
    }
}

/// Hex SHA-256 of a stored password hash.
///
/// Reset tokens embed this value; any password change produces a new hash and
/// therefore a new version, which invalidates every reset token issued before it.
pub fn password_version(password_hash: &str) -> String {
    hex::encode(Sha256::digest(password_hash.as_bytes()))
}
