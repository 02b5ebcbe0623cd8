//! Password hashing with bcrypt.

use bcrypt::{hash, verify};

use crate::error::Error;
use crate::secret::Secret;

/// Hashes and verifies account passwords at a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// A hasher using `cost` rounds (4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Bcrypt hash (salt included) for storage in `users.password`.
    pub fn hash(&self, password: &Secret<String>) -> Result<String, Error> {
        Ok(hash(password.expose_secret(), self.cost)?)
    }

    /// Whether `password` matches the stored hash.
    ///
    /// A malformed stored hash is an error, not a mismatch.
    pub fn verify(&self, password: &Secret<String>, stored: &str) -> Result<bool, Error> {
        Ok(verify(password.expose_secret(), stored)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let password = Secret::new("password123".to_string());
        let stored = hasher.hash(&password).unwrap();
        assert_ne!(stored, "password123");
        assert!(hasher.verify(&password, &stored).unwrap());
        assert!(!hasher
            .verify(&Secret::new("password124".to_string()), &stored)
            .unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let err = hasher()
            .verify(&Secret::new("password123".to_string()), "not-a-hash")
            .unwrap_err();
        assert!(matches!(err, Error::Password(_)));
    }
}
