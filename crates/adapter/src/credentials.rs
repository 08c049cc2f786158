//! Argon2 credential hasher

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use domain::{CredentialHasher, HashError};

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`)
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom cost parameters (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params =
            Params::new(m_cost, t_cost, p_cost, None).map_err(|e| HashError(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(format!("Hashing failed: {}", e)))
    }
}
