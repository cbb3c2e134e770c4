//! Password hashing using Argon2id
//!
//! Hashes are PHC strings, so verification reads the algorithm, parameters
//! and salt back from the stored value.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::auth::PasswordHasher;
//! use catalog_service::config::PasswordConfig;
//!
//! let hasher = PasswordHasher::new(&PasswordConfig {
//!     memory_cost_kib: 8,
//!     time_cost: 1,
//!     parallelism: 1,
//! })
//! .unwrap();
//!
//! let hash = hasher.hash("Str0ng&Passw0rd!").unwrap();
//! assert!(hasher.verify("Str0ng&Passw0rd!", &hash).unwrap());
//! assert!(!hasher.verify("wrong", &hash).unwrap());
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::error::{Error, Result};

/// Argon2id hasher with configured cost parameters
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher; rejects parameters Argon2 cannot run with
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| {
            Error::Config(Box::new(figment::Error::from(format!(
                "Invalid Argon2 parameters (memory_cost_kib={}, time_cost={}, parallelism={}): {}",
                config.memory_cost_kib, config.time_cost, config.parallelism, e
            ))))
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC string
    ///
    /// A mismatch is `Ok(false)`; a malformed hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 8,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap();
        let hash = hasher.hash("passwordtest!1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("passwordtest!1", &hash).unwrap());
        assert!(!hasher.verify("passwordtest!2", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        let first = hasher.hash("same").unwrap();
        let second = hasher.hash("same").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("same", &second).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(cheap().verify("password", "not_a_valid_hash").is_err());
    }

    #[test]
    fn test_invalid_parameters_are_a_config_error() {
        let result = PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1,
            time_cost: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
