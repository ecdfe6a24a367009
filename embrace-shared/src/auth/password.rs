/// Password hashing with Argon2id
///
/// [`CredentialService`] produces PHC strings with the algorithm, cost
/// parameters and a random 16-byte salt embedded, so a hash stays verifiable
/// after the configured parameters change.
///
/// # Default parameters
///
/// - **Memory**: 64 MiB (65536 KiB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use embrace_shared::auth::password::{Argon2Params, CredentialService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = CredentialService::new(Argon2Params::default())?;
///
/// let hash = credentials.hash("longenough1")?;
/// assert!(credentials.verify("longenough1", &hash)?);
/// assert!(!credentials.verify("wrong_password", &hash)?);
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
    /// Cost parameters rejected by argon2
    #[error("Invalid Argon2 parameters: {0}")]
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

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,

    /// Hash length in bytes
    pub output_len: usize,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

/// Hashes and verifies user passwords
#[derive(Debug, Clone)]
pub struct CredentialService {
    params: Params,
}

impl CredentialService {
    /// Creates a service with the given cost parameters
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` when argon2 rejects the
    /// combination (e.g. memory below 8 KiB per lane).
    pub fn new(params: Argon2Params) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(params.memory_kib)
            .t_cost(params.iterations)
            .p_cost(params.parallelism)
            .output_len(params.output_len)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hashes a plaintext password into a PHC string
    ///
    /// ```text
    /// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
    /// ```
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored PHC string
    ///
    /// Parameters are read from the hash itself. The comparison is
    /// constant-time.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidHash` for a malformed hash; a wrong
    /// password is `Ok(false)`, not an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
            return Err(PasswordError::InvalidHash(
                "missing salt or hash output".to_string(),
            ));
        }
        Params::try_from(&parsed_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }

    /// Like [`verify`](Self::verify), treating any failure as a mismatch
    pub fn matches(&self, plaintext: &str, hash: &str) -> bool {
        self.verify(plaintext, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep the suite fast; production defaults are covered
    // by one dedicated test.
    fn fast() -> CredentialService {
        CredentialService::new(Argon2Params {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
        })
        .expect("valid params")
    }

    #[test]
    fn test_hash_embeds_default_parameters() {
        let credentials = CredentialService::new(Argon2Params::default()).unwrap();
        let hash = credentials.hash("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let credentials = fast();

        let hash1 = credentials.hash("same_password").unwrap();
        let hash2 = credentials.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let credentials = fast();
        let hash = credentials.hash("longenough1").unwrap();

        assert!(credentials.verify("longenough1", &hash).unwrap());
        assert!(!credentials.verify("longenough2", &hash).unwrap());
        assert!(!credentials.verify("", &hash).unwrap());
    }

    #[test]
    fn test_verify_survives_parameter_change() {
        let hash = fast().hash("longenough1").unwrap();
        let stronger = CredentialService::new(Argon2Params {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
            output_len: 32,
        })
        .unwrap();

        assert!(stronger.verify("longenough1", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        let credentials = fast();

        assert!(matches!(
            credentials.verify("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(credentials.verify("password", "$argon2id$invalid").is_err());
        assert!(!credentials.matches("password", "invalid_hash"));
    }

    #[test]
    fn test_verify_incomplete_hash_is_error() {
        let credentials = fast();
        let hash = credentials.hash("password").unwrap();

        // Parameters only, then parameters and salt without the output
        let params_only = hash.rsplitn(3, '$').nth(2).unwrap().to_string();
        let without_output = hash.rsplitn(2, '$').nth(1).unwrap().to_string();

        for truncated in [
            "$argon2id$v=19$m=1024,t=1,p=1".to_string(),
            "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHRzYWx0".to_string(),
            params_only,
            without_output,
        ] {
            assert!(
                matches!(
                    credentials.verify("password", &truncated),
                    Err(PasswordError::InvalidHash(_))
                ),
                "{} should be rejected",
                truncated
            );
            assert!(!credentials.matches("password", &truncated));
        }
    }

    #[test]
    fn test_verify_rejects_out_of_range_parameters() {
        let credentials = fast();
        let hash = credentials.hash("password").unwrap();
        let broken = hash.replace("p=1", "p=0");

        assert!(matches!(
            credentials.verify("password", &broken),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_unicode_password() {
        let credentials = fast();
        let hash = credentials.hash("unicode-密码-パスワード").unwrap();

        assert!(credentials.matches("unicode-密码-パスワード", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = CredentialService::new(Argon2Params {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
            output_len: 32,
        });

        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
