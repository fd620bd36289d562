//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so the salt and the cost parameters travel with the hash and verification
//! never depends on the current configuration.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Argon2 cost settings: memory in KiB, number of passes and lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes and verifies passwords. Cheap to clone, so it can be moved into
/// `spawn_blocking` closures.
#[derive(Clone, Debug)]
pub struct CredentialManager {
    params: Params,
    // Used to spend the same work on unknown usernames as on known ones.
    decoy_hash: String,
}

impl CredentialManager {
    /// # Errors
    /// Returns an error if the cost parameters are rejected by Argon2.
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(HashError::Params)?;

        let mut manager = Self {
            params,
            decoy_hash: String::new(),
        };
        manager.decoy_hash = manager.hash("portier-decoy-password")?;

        Ok(manager)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if Argon2 fails to produce a hash.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(HashError::Hash)
    }

    /// Check `plaintext` against a stored PHC string. Malformed hashes never
    /// match.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        self.hasher()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification against a throwaway hash. Always returns `false`.
    #[must_use]
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.decoy_hash);
        false
    }
}

/// Lowest accepted Argon2 cost, for tests only.
#[cfg(test)]
pub(crate) fn cheap() -> CredentialManager {
    CredentialManager::new(HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap_or_else(|e| panic!("cheap argon2 params rejected: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let manager = cheap();
        let hash = manager.hash("pw1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(manager.verify("pw1", &hash));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let manager = cheap();
        let hash = manager.hash("pw1").unwrap();

        assert!(!manager.verify("pw2", &hash));
        assert!(!manager.verify("", &hash));
    }

    #[test]
    fn salt_is_random_per_call() {
        let manager = cheap();
        let first = manager.hash("same").unwrap();
        let second = manager.hash("same").unwrap();

        assert_ne!(first, second);
        assert!(manager.verify("same", &first));
        assert!(manager.verify("same", &second));
    }

    #[test]
    fn hash_is_not_plaintext() {
        let manager = cheap();
        let hash = manager.hash("hunter2").unwrap();

        assert!(!hash.contains("hunter2"));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        let manager = cheap();

        assert!(!manager.verify("pw", ""));
        assert!(!manager.verify("pw", "not-a-hash"));
        assert!(!manager.verify("pw", "$argon2id$v=19$m=8,t=1,p=1$garbage"));
        assert!(!manager.verify("pw", "$2b$10$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn verify_uses_cost_embedded_in_hash() {
        let hash = cheap().hash("pw").unwrap();
        let stronger = CredentialManager::new(HashCost {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(stronger.verify("pw", &hash));
    }

    #[test]
    fn decoy_never_matches() {
        let manager = cheap();

        assert!(!manager.verify_decoy("portier-decoy-password"));
        assert!(!manager.verify_decoy("anything"));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let result = CredentialManager::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });

        assert!(matches!(result, Err(HashError::Params(_))));
    }
}
