//! ULID id generator
//!
//! 48-bit millisecond timestamp followed by 80 random bits, rendered as a
//! 26-character Crockford base32 string. Ids sort by creation time.

use domain::IdGenerator;
use ulid::Ulid;

#[derive(Debug, Clone, Copy, Default)]
pub struct UlidGenerator;

impl IdGenerator for UlidGenerator {
    fn next_id(&self) -> String {
        Ulid::new().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_ulids() {
        let id = UlidGenerator.next_id();
        assert_eq!(id.len(), 26);
        assert!(Ulid::from_string(&id).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..10_000).map(|_| UlidGenerator.next_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
