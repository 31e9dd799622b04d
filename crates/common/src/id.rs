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
    /// ULIDs are lexicographically sortable and monotonically increasing
    /// within the same millisecond, so ordering rows by `id` matches
    /// creation order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // UUID v4: no time component
        Uuid::new_v4().simple().to_string()
    }
}
