//! Core types shared across the sync layer.

use serde::{Deserialize, Serialize};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fmt;

/// The three kinds of entity the store holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The singleton profile document.
    Profile,
    /// Visitor contact messages.
    Message,
    /// Recruiter-outreach records.
    HrRecord,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Profile, EntityKind::Message, EntityKind::HrRecord];

    /// The collection backing this kind, if it is not the singleton.
    pub fn collection(self) -> Option<CollectionKind> {
        match self {
            EntityKind::Profile => None,
            EntityKind::Message => Some(CollectionKind::Messages),
            EntityKind::HrRecord => Some(CollectionKind::HrRecords),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Profile => write!(f, "profile"),
            EntityKind::Message => write!(f, "message"),
            EntityKind::HrRecord => write!(f, "hr_record"),
        }
    }
}

/// Named collections in the remote store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollectionKind {
    Messages,
    HrRecords,
}

impl CollectionKind {
    /// Collection name as stored remotely.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Messages => "messages",
            CollectionKind::HrRecords => "hr_records",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Path of a singleton document, e.g. `portfolio_data/profile`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey(pub String);

impl DocumentKey {
    pub fn new(path: impl Into<String>) -> Self {
        DocumentKey(path.into())
    }

    /// Where the profile document lives.
    pub fn profile() -> Self {
        DocumentKey::new("portfolio_data/profile")
    }
}

impl Default for DocumentKey {
    fn default() -> Self {
        DocumentKey::profile()
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({})", self.0)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction for an ordered collection subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering requested from the store for a collection subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }
}

/// Content fingerprint (SHA-256) of a serialized value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Compute fingerprint from bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Fingerprint(hasher.finalize().into())
    }

    /// Fingerprint of a value's JSON encoding.
    pub fn of<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::from_bytes(&serde_json::to_vec(value)?))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}...)", self.short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_stable() {
        let a = Fingerprint::of(&json!({"name": "A"})).unwrap();
        let b = Fingerprint::of(&json!({"name": "A"})).unwrap();
        let c = Fingerprint::of(&json!({"name": "B"})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn test_fingerprint_reports_unencodable_value() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let mut map = HashMap::new();
        map.insert(vec![1u8], "x");
        assert!(Fingerprint::of(&map).is_err());
    }

    #[test]
    fn test_entity_collections() {
        assert_eq!(EntityKind::Profile.collection(), None);
        assert_eq!(EntityKind::Message.collection(), Some(CollectionKind::Messages));
        assert_eq!(CollectionKind::HrRecords.name(), "hr_records");
    }
}
