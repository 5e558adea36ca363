use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::{AppError, codes};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| {
            AppError::internal(codes::INTERNAL_ERROR, format!("password hashing failed: {err}"))
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|err| {
        AppError::internal(codes::INTERNAL_ERROR, format!("stored password hash is invalid: {err}"))
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_and_rejects_other() {
        let hash = hash_password("correct horse").expect("hash should succeed");

        assert!(verify_password("correct horse", &hash).expect("verify should run"));
        assert!(!verify_password("battery staple", &hash).expect("verify should run"));
    }

    #[test]
    fn corrupt_hash_is_an_internal_error() {
        let err = verify_password("anything", "not-a-phc-string").expect_err("must fail");
        assert_eq!(err.code(), codes::INTERNAL_ERROR);
    }
}
