//! crates/habit_tracker_core/src/auth.rs
//!
//! Account registration and credential checks built on the user and
//! credential ports.

use crate::domain::{NewUser, User};
use crate::ports::{CredentialService, PortError, PortResult, UserRepository};

/// Hashes `plaintext` and stores a new active user.
///
/// Callers validate the plaintext first; hashing only happens for input that
/// passed the password rules.
pub async fn register(
    users: &dyn UserRepository,
    credentials: &dyn CredentialService,
    name: &str,
    email: &str,
    plaintext: &str,
) -> PortResult<User> {
    let password_hash = credentials.hash_password(plaintext).await?;
    users
        .insert_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            active: true,
        })
        .await
}

/// Returns the id of the active user owning `email` when `plaintext` matches.
///
/// Unknown email, inactive account and wrong password all produce the same
/// `InvalidCredentials` error.
pub async fn authenticate(
    users: &dyn UserRepository,
    credentials: &dyn CredentialService,
    email: &str,
    plaintext: &str,
) -> PortResult<i64> {
    let user = match users.get_user_by_email(email).await {
        Ok(user) if user.active => user,
        Ok(_) | Err(PortError::NotFound(_)) => return Err(PortError::InvalidCredentials),
        Err(e) => return Err(e),
    };

    if credentials
        .verify_password(&user.password_hash, plaintext)
        .await?
    {
        Ok(user.id)
    } else {
        Err(PortError::InvalidCredentials)
    }
}
