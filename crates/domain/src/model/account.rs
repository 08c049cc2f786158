//! Account - a user identity holding a one-way credential hash

use super::Record;

/// Stored account.
///
/// `password_hash` only ever holds the derived hash. It is for internal use
/// (credential checks) and has no counterpart in any wire message.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl Record for Account {
    const KIND: &'static str = "account";

    fn id(&self) -> &str {
        &self.id
    }
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
