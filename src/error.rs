//! Error types for synchronization and write operations.

use crate::types::{CollectionKind, EntityKind};
use thiserror::Error;

/// Main error type for store, draft and write operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: CollectionKind, id: String },

    #[error("Draft entry not found: {0}")]
    DraftEntryNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upload too large: {size} bytes (limit {limit})")]
    SizeExceeded { size: usize, limit: usize },

    #[error("Subscription to {0} could not be established: {1}")]
    Subscription(EntityKind, String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl SyncError {
    /// Whether a caller may reasonably retry the same operation later.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Connectivity(_) | SyncError::Subscription(..))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            SyncError::Deserialization(e.to_string())
        } else {
            SyncError::Serialization(e.to_string())
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SyncError::Connectivity("down".into()).is_transient());
        assert!(!SyncError::Permission("nope".into()).is_transient());
        assert!(!SyncError::Validation("name".into()).is_transient());
    }

    #[test]
    fn test_not_found_display() {
        let err = SyncError::NotFound {
            collection: CollectionKind::HrRecords,
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "hr_records record not found: abc");
    }

    #[test]
    fn test_decode_error_maps_to_deserialization() {
        let err: SyncError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, SyncError::Deserialization(_)));
    }

    #[test]
    fn test_validation_display() {
        let err = crate::model::RecordStatus::parse("Maybe").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: unknown status 'Maybe'");

        let err = crate::model::MessageFields::new("A", "", "", "hi")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: email is required");
    }
}
