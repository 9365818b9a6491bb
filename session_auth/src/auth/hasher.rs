//! Argon2id credential hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

/// Hashing errors. A wrong password is not one of them.
#[derive(Debug, Error)]
pub enum HashError {
    /// Stored hash is not a valid PHC string
    #[error("Stored password hash is malformed")]
    MalformedHash,

    /// Cost parameters rejected by argon2
    #[error("Invalid hash parameters: {0}")]
    InvalidParams(String),

    /// Hash computation failed
    #[error("Hash computation failed: {0}")]
    Compute(String),
}

/// Argon2 cost factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashCost {
    /// Cheapest parameters argon2 accepts. Only for tests.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
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

/// Salted one-way password hasher
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy_hash: String,
}

impl CredentialHasher {
    /// Create a hasher with the given cost
    ///
    /// # Errors
    ///
    /// * `HashError::InvalidParams` - Cost rejected by argon2
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            decoy_hash: String::new(),
        };
        let decoy = SaltString::generate(&mut OsRng);
        hasher.decoy_hash = hasher.hash(decoy.as_str())?;
        Ok(hasher)
    }

    /// Hash a plaintext password with a fresh random salt
    ///
    /// The output is a PHC string with salt and parameters embedded.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Compute(e.to_string()))?
            .to_string())
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match
    ///
    /// # Errors
    ///
    /// * `HashError::MalformedHash` - `hash` is not a PHC string
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| HashError::MalformedHash)?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Compute(e.to_string())),
        }
    }

    /// Spend the same work as a real verification, for unknown accounts
    pub fn verify_decoy(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.decoy_hash);
    }
}
