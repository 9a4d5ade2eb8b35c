//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable by creation time, which keeps the
    /// `id desc` tie-break of the feed queries roughly chronological.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random token.
    ///
    /// Used for storage path suffixes and voter tokens. It carries no time
    /// component and is not a secret.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
