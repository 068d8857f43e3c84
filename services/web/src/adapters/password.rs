//! services/web/src/adapters/password.rs
//!
//! Argon2 implementation of the `CredentialService` port. Hashing is
//! deliberately slow, so both operations run on the blocking thread pool.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash as PhcHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use habit_tracker_core::domain::PasswordHash;
use habit_tracker_core::ports::{CredentialService, PortError, PortResult};
use tracing::error;

/// Salted argon2 hashing with the library's default parameters.
#[derive(Clone, Default)]
pub struct Argon2Credentials {
    argon2: Argon2<'static>,
}

impl Argon2Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses explicit cost parameters instead of the defaults.
    pub fn with_params(params: argon2::Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    fn hash_blocking(&self, plaintext: &str) -> PortResult<PasswordHash> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("Failed to hash password".to_string())
            })?;
        Ok(PasswordHash::new(hash.to_string()))
    }

    fn verify_blocking(&self, hash: &PasswordHash, plaintext: &str) -> PortResult<bool> {
        let parsed = PhcHash::new(hash.as_str()).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("Stored password hash is unreadable".to_string())
        })?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(PortError::Unexpected(format!("password verification failed: {e}"))),
        }
    }
}

#[async_trait]
impl CredentialService for Argon2Credentials {
    async fn hash_password(&self, plaintext: &str) -> PortResult<PasswordHash> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&plaintext))
            .await
            .map_err(|e| PortError::Unexpected(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, hash: &PasswordHash, plaintext: &str) -> PortResult<bool> {
        let hasher = self.clone();
        let hash = hash.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&hash, &plaintext))
            .await
            .map_err(|e| PortError::Unexpected(format!("verification task failed: {e}")))?
    }
}
