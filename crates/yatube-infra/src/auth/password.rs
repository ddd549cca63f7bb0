//! Account passwords, stored as Argon2 PHC strings.
//!
//! A stored value that is not a PHC string (an account created without a
//! usable password, or a hash from some other scheme) never matches. Login
//! then fails the same way a wrong password does.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use yatube_core::ports::{AuthError, PasswordService};

/// Hashes and checks account passwords with Argon2id.
#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let Ok(hash) = PasswordHash::new(stored) else {
            tracing::warn!("Stored password is not an Argon2 hash; treating as unusable");
            return Ok(false);
        };
        Ok(self.argon2.verify_password(password.as_bytes(), &hash).is_ok())
    }
}
