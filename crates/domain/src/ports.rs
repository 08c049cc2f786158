//! Ports for credential hashing and id assignment
//!
//! Implemented in the adapter crate (argon2, ULID).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("credential hashing failed: {0}")]
pub struct HashError(pub String);

/// One-way credential derivation
pub trait CredentialHasher: Send + Sync {
    /// Derive a salted hash of `plaintext`. May be CPU intensive.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
}

/// Source of new record ids.
///
/// Ids must be unique with negligible collision probability and must not be
/// sequential or guessable.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}
