//! services/app/src/adapters/hasher.rs
//!
//! Argon2 implementation of the `SecretHasher` port. Secrets are stored as PHC strings.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use questlog_core::ports::{PortError, PortResult, SecretHasher};
use tracing::error;

#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash secret: {:?}", e);
                PortError::Unexpected("Failed to hash secret".to_string())
            })
    }

    fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Failed to parse stored hash: {:?}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
