//! Persistent storage for domain records.

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod sqlite;

use thiserror::Error;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use crate::core::RecordStore;

/// The collection (table) name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "domains";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open record store: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("invalid collection name '{0}': use letters, digits and underscores")]
    InvalidCollection(String),

    #[error("failed to prepare collection '{collection}': {source}")]
    Schema {
        collection: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("record store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

/// Checks that a collection name is a plain SQL identifier.
pub fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("domains").is_ok());
        assert!(validate_collection_name("_nrd_2025").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("1domains").is_err());
        assert!(validate_collection_name("domains; DROP TABLE x").is_err());
        assert!(validate_collection_name("new-domains").is_err());
    }
}
