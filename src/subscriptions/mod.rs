//! Live snapshot subscriptions.
//!
//! The manager keeps at most one remote subscription (a *feed*) per entity
//! kind and fans each decoded snapshot out to every open observer handle:
//! - Snapshots are full values, never deltas; each supersedes the last
//! - Per kind, observers see snapshots in feed order
//! - A feed that cannot be established or breaks yields a `Broken` event,
//!   never an empty snapshot
//! - The first absent profile triggers exactly one default write
//!
//! # Example
//!
//! ```ignore
//! let manager = SnapshotSubscriptionManager::new(store, SubscriptionConfig::default());
//! let handle = manager.open(EntityKind::Message);
//!
//! // On each turn of the event loop
//! manager.pump();
//! while let Some(event) = handle.try_recv() {
//!     match event {
//!         SnapshotEvent::Snapshot(Snapshot::Messages(messages)) => render(&messages),
//!         SnapshotEvent::Broken { reason, .. } => show_offline(reason),
//!         _ => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SnapshotSubscriptionManager;
pub use types::{
    FaultReason, Snapshot, SnapshotEvent, SnapshotHandle, SubscriptionConfig, SubscriptionId,
};
