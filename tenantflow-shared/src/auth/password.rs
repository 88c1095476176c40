/// Credential hashing using Argon2id
///
/// User and member passwords are stored as PHC strings
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). The cost parameters are
/// embedded in every hash, so verification keeps working after the configured
/// cost changes; only new hashes pick up the new parameters.
///
/// Callers depend on the [`CredentialHasher`] trait rather than on Argon2
/// directly, which lets tests swap in a cheap configuration.
///
/// # Example
///
/// ```
/// use tenantflow_shared::auth::password::{Argon2Hasher, CredentialHasher, HasherConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::new(HasherConfig::default())?;
///
/// let hash = hasher.hash("super_secret_password_123")?;
/// assert!(hasher.verify("super_secret_password_123", &hash)?);
/// assert!(!hasher.verify("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters were rejected
    #[error("Invalid hasher parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way hashing of secrets with constant-time verification
pub trait CredentialHasher: Send + Sync {
    /// Hashes `plain` with a fresh random salt
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;

    /// Checks `plain` against a stored hash
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only when the stored hash
    /// itself is unusable.
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HasherConfig {
    /// 64 MiB, 3 passes, 4 lanes
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// [`CredentialHasher`] backed by Argon2id
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Builds a hasher, validating the cost parameters up front
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the parameters
    /// (for example a memory cost below 8 KiB per lane).
    pub fn new(config: HasherConfig) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(config.memory_kib)
            .t_cost(config.iterations)
            .p_cost(config.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
        if parsed_hash.hash.is_none() {
            return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
        }

        // Parameters come from the stored hash, not from self.params.
        match Argon2::default().verify_password(plain.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}
