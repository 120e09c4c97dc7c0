//! Credential hashing
//!
//! Passwords are hashed with Argon2id and a fresh random salt per account.
//! The stored value is a PHC string, so the parameters used at registration
//! travel with the hash and verification keeps working if defaults change.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Version};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Default Argon2id parameters
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id cost parameters for password hashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    pub time_cost: u32,
    /// Memory in KiB
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Params {
    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| Error::internal_msg(format!("Invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password into a PHC string
pub fn hash_password(password: &str, params: &Argon2Params) -> Result<String> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::internal_msg(format!("Failed to encode salt: {}", e)))?;
    let hash = params
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::internal_msg(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
///
/// A mismatch is reported as [`Error::InvalidCredentials`]; a malformed
/// stored hash is an internal error.
pub fn verify_password(password: &str, stored: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::internal_msg(format!("Stored credential is malformed: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(Error::InvalidCredentials),
        Err(e) => Err(Error::internal_msg(format!("Failed to verify password: {}", e))),
    }
}
