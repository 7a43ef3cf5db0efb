//! Subscription types for live snapshot delivery.

use super::manager::Shared;
use crate::model::{HrRecord, Message, Profile};
use crate::remote::Query;
use crate::types::{CollectionKind, DocumentKey, EntityKind, OrderBy};
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Configuration for the subscription manager.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max undelivered events per observer before it is dropped.
    /// Default: 256
    pub buffer_size: usize,

    /// Location of the profile document.
    pub profile_key: DocumentKey,

    /// Order requested from the store for the message feed.
    /// Default: `date` descending.
    pub message_order: OrderBy,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            profile_key: DocumentKey::profile(),
            message_order: OrderBy::descending("date"),
        }
    }
}

impl SubscriptionConfig {
    /// The store query backing the feed for `kind`. HR records are unordered.
    pub fn query(&self, kind: EntityKind) -> Query {
        match kind {
            EntityKind::Profile => Query::Document(self.profile_key.clone()),
            EntityKind::Message => Query::Collection {
                collection: CollectionKind::Messages,
                order: Some(self.message_order.clone()),
            },
            EntityKind::HrRecord => Query::Collection {
                collection: CollectionKind::HrRecords,
                order: None,
            },
        }
    }
}

/// A complete, immutable value of one entity kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Snapshot {
    Profile(Arc<Profile>),
    Messages(Arc<[Message]>),
    HrRecords(Arc<[HrRecord]>),
}

impl Snapshot {
    /// Entity kind this snapshot carries.
    pub fn kind(&self) -> EntityKind {
        match self {
            Snapshot::Profile(_) => EntityKind::Profile,
            Snapshot::Messages(_) => EntityKind::Message,
            Snapshot::HrRecords(_) => EntityKind::HrRecord,
        }
    }

    /// The profile, if this is a profile snapshot.
    pub fn as_profile(&self) -> Option<&Arc<Profile>> {
        match self {
            Snapshot::Profile(p) => Some(p),
            _ => None,
        }
    }

    /// The message list, if this is a message snapshot.
    pub fn as_messages(&self) -> Option<&Arc<[Message]>> {
        match self {
            Snapshot::Messages(m) => Some(m),
            _ => None,
        }
    }

    /// The HR records, if this is an HR snapshot.
    pub fn as_hr_records(&self) -> Option<&Arc<[HrRecord]>> {
        match self {
            Snapshot::HrRecords(r) => Some(r),
            _ => None,
        }
    }
}

/// Events delivered to a [`SnapshotHandle`].
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotEvent {
    /// A new full value; supersedes every earlier one.
    Snapshot(Snapshot),

    /// The feed is broken. Distinct from an empty snapshot.
    Broken { kind: EntityKind, reason: FaultReason },
}

/// Why a feed or an observer stopped delivering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultReason {
    /// The store refused or could not establish the subscription.
    Unreachable(String),
    /// The live stream reported a fault or closed.
    StreamFault(String),
    /// A snapshot could not be decoded into the entity type.
    Undecodable(String),
    /// Writing the default profile failed.
    MaterializeFailed(String),
    /// The profile document is gone and its default was already written once.
    ProfileAbsent,
    /// This observer fell behind its buffer and was dropped.
    Lagged,
    /// The manager went away.
    Disconnected,
}

/// Unique identifier for an observer subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to one observer subscription.
///
/// Dropping the handle closes it. Once [`close`](Self::close) returns, the
/// handle yields nothing further.
pub struct SnapshotHandle {
    pub(super) id: SubscriptionId,
    pub(super) kind: EntityKind,
    pub(super) receiver: Receiver<SnapshotEvent>,
    pub(super) shared: Weak<Shared>,
    pub(super) closed: AtomicBool,
    /// Set once the disconnection has been reported.
    pub(super) ended: AtomicBool,
}

impl SnapshotHandle {
    /// Identifier of this observer.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Entity kind this handle observes.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Take the next delivered event, if any (non-blocking).
    pub fn try_recv(&self) -> Option<SnapshotEvent> {
        if self.is_closed() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.ended.swap(true, Ordering::SeqCst) {
                    return None;
                }
                let reason = if self.shared.upgrade().is_some() {
                    FaultReason::Lagged
                } else {
                    FaultReason::Disconnected
                };
                Some(SnapshotEvent::Broken {
                    kind: self.kind,
                    reason,
                })
            }
        }
    }

    /// Take every event delivered so far, in delivery order.
    pub fn drain(&self) -> Vec<SnapshotEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop delivery. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.release(self.id, self.kind);
        }
        // Discard anything already buffered.
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SnapshotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}
