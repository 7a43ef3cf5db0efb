//! The remote document store boundary.
//!
//! The store is authoritative for one singleton document (the profile) and
//! two collections (messages and HR records). Everything else in the crate
//! receives it as an injected `Arc<dyn RemoteStore>` and only ever talks to
//! it through this trait.
//!
//! Subscriptions deliver *full* snapshots over a channel, never deltas. A
//! stream that breaks delivers one [`RemoteEvent::Fault`] and then
//! disconnects.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{CollectionKind, DocumentKey, EntityKind, OrderBy};
use serde_json::{Map, Value};

/// One record of a collection snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteRecord {
    /// Store-assigned id.
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Full state of one subscribed target.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteSnapshot {
    /// `None` when the document does not exist.
    Document(Option<Map<String, Value>>),
    Collection(Vec<RemoteRecord>),
}

/// Events delivered on a remote subscription.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    Snapshot(RemoteSnapshot),
    /// The stream broke; no further events follow.
    Fault(String),
}

/// What a subscription watches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Document(DocumentKey),
    Collection {
        collection: CollectionKind,
        order: Option<OrderBy>,
    },
}

impl Query {
    pub fn kind(&self) -> EntityKind {
        match self {
            Query::Document(_) => EntityKind::Profile,
            Query::Collection {
                collection: CollectionKind::Messages,
                ..
            } => EntityKind::Message,
            Query::Collection {
                collection: CollectionKind::HrRecords,
                ..
            } => EntityKind::HrRecord,
        }
    }
}

/// Unique identifier for a remote subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RemoteSubscriptionId(pub u64);

/// A live remote subscription.
pub struct RemoteSubscription {
    pub id: RemoteSubscriptionId,
    pub receiver: crossbeam_channel::Receiver<RemoteEvent>,
}

/// Capability surface of the authoritative store.
///
/// Every write is atomic. Writes never return the new state; it becomes
/// visible through subsequent snapshots.
pub trait RemoteStore: Send + Sync {
    /// Start a subscription. The current state is delivered as the first
    /// snapshot.
    fn subscribe(&self, query: &Query) -> Result<RemoteSubscription>;

    /// Stop a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: RemoteSubscriptionId);

    /// Write a document. With `merge`, only the supplied top-level fields
    /// are replaced; otherwise the document is replaced entirely.
    fn put_document(&self, key: &DocumentKey, fields: Map<String, Value>, merge: bool)
        -> Result<()>;

    /// Insert a record, returning its store-assigned id.
    fn insert(&self, collection: CollectionKind, record: Map<String, Value>) -> Result<String>;

    /// Replace the supplied fields of an existing record.
    fn patch(&self, collection: CollectionKind, id: &str, fields: Map<String, Value>)
        -> Result<()>;

    fn delete(&self, collection: CollectionKind, id: &str) -> Result<()>;
}
