use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Memory cost in KiB (19 MiB).
pub const MEMORY_COST_KIB: u32 = 19 * 1024;

/// Number of passes over memory.
pub const TIME_COST: u32 = 2;

/// Degree of parallelism.
pub const PARALLELISM: u32 = 1;

/// Well-formed hash with the default work factor that no password produces.
const EQUALIZATION_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nLWVxdWFsaXplcg$7HGp2s4KEK9ozTxletxUj07Mr9RYdidR9NzL2kFKoMA";

/// Password hashing implementation.
///
/// Argon2id with a fixed work factor, sized so one hash costs tens of
/// milliseconds on commodity hardware. Hashes are self-describing PHC strings,
/// so verification always uses the parameters a hash was created with.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl PasswordHasher {
    /// Create a new password hasher with the default work factor.
    pub fn new() -> Self {
        Self {
            memory_cost_kib: MEMORY_COST_KIB,
            time_cost: TIME_COST,
            parallelism: PARALLELISM,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a plaintext password securely.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Salt generation or hashing failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison is constant-time. A mismatch is `Ok(false)`.
    ///
    /// # Errors
    /// * `VerificationFailed` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Run one verification against a fixed dummy hash.
    ///
    /// Lets callers answer "unknown account" in the same time as "wrong password".
    pub fn equalize_timing(&self, password: &str) {
        let _ = self.verify(password, EQUALIZATION_HASH);
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
