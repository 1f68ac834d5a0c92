//! Password hashing

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};

use crate::error::{ApiError, ApiResult};

/// Hash `password` with Argon2 and a random salt, in PHC string form
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}
