//! Subscription manager: one live feed per entity kind, fanned out to
//! observers as typed snapshots.

use crate::error::{Result, SyncError};
use crate::model::{HrRecord, Message, Profile};
use crate::remote::{RemoteEvent, RemoteSnapshot, RemoteStore, RemoteSubscription};
use crate::types::EntityKind;
use crossbeam_channel::{bounded, Sender, TryRecvError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{
    FaultReason, Snapshot, SnapshotEvent, SnapshotHandle, SubscriptionConfig, SubscriptionId,
};

/// Internal observer state.
struct Observer {
    kind: EntityKind,
    sender: Sender<SnapshotEvent>,
}

impl Observer {
    /// Try to send an event. Returns false if buffer is full (observer will be dropped).
    fn try_send(&self, event: SnapshotEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// A live remote subscription for one kind.
struct Feed {
    subscription: RemoteSubscription,
    /// Last snapshot observed on this feed.
    latest: Option<Snapshot>,
}

/// Outcome of decoding one remote snapshot.
enum Decoded {
    Ready(Snapshot),
    /// The profile is absent and its default is on the way.
    Pending,
    /// The profile is absent after its default was already written.
    Absent,
}

pub(super) struct Shared {
    remote: Arc<dyn RemoteStore>,
    config: SubscriptionConfig,
    /// Live feeds by kind. Lock order: `feeds` before `observers`.
    feeds: Mutex<HashMap<EntityKind, Feed>>,
    observers: RwLock<HashMap<SubscriptionId, Observer>>,
    next_id: AtomicU64,
    /// Whether the default profile has been written by this manager.
    default_materialized: AtomicBool,
}

impl Shared {
    /// Remove an observer; release the feed when it was the last one.
    pub(super) fn release(&self, id: SubscriptionId, kind: EntityKind) {
        let mut feeds = self.feeds.lock();
        let remaining = {
            let mut observers = self.observers.write();
            observers.remove(&id);
            observers.values().filter(|o| o.kind == kind).count()
        };
        if remaining == 0 {
            if let Some(feed) = feeds.remove(&kind) {
                self.remote.unsubscribe(feed.subscription.id);
                debug!(%kind, "feed released");
            }
        }
    }

    fn establish(&self, feeds: &mut HashMap<EntityKind, Feed>, kind: EntityKind) -> Result<()> {
        let subscription = self
            .remote
            .subscribe(&self.config.query(kind))
            .map_err(|e| SyncError::Subscription(kind, e.to_string()))?;
        info!(%kind, remote = subscription.id.0, "feed established");
        feeds.insert(
            kind,
            Feed {
                subscription,
                latest: None,
            },
        );
        Ok(())
    }

    fn decode(&self, kind: EntityKind, raw: RemoteSnapshot) -> Result<Decoded> {
        match (kind, raw) {
            (EntityKind::Profile, RemoteSnapshot::Document(Some(fields))) => Ok(Decoded::Ready(
                Snapshot::Profile(Arc::new(Profile::from_fields(&fields)?)),
            )),
            (EntityKind::Profile, RemoteSnapshot::Document(None)) => {
                if self.materialize_default()? {
                    Ok(Decoded::Pending)
                } else {
                    Ok(Decoded::Absent)
                }
            }
            (EntityKind::Message, RemoteSnapshot::Collection(records)) => {
                let messages = records
                    .iter()
                    .map(Message::from_record)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Decoded::Ready(Snapshot::Messages(messages.into())))
            }
            (EntityKind::HrRecord, RemoteSnapshot::Collection(records)) => {
                let records = records
                    .iter()
                    .map(HrRecord::from_record)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Decoded::Ready(Snapshot::HrRecords(records.into())))
            }
            (kind, _) => Err(SyncError::Deserialization(format!(
                "snapshot shape does not match {kind}"
            ))),
        }
    }

    /// Write the default profile, at most once per manager. Returns whether
    /// this call wrote it.
    fn materialize_default(&self) -> Result<bool> {
        if self.default_materialized.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let fields = Profile::default_document().to_fields()?;
        match self.remote.put_document(&self.config.profile_key, fields, false) {
            Ok(()) => {
                info!(key = %self.config.profile_key, "profile absent; default materialized");
                Ok(true)
            }
            Err(e) => {
                // Not written, so a later absent observation may try again.
                self.default_materialized.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Deliver to every observer of `kind`. Drops observers that cannot keep up.
    fn broadcast(&self, kind: EntityKind, event: SnapshotEvent) -> usize {
        let mut delivered = 0;
        let mut to_remove = Vec::new();

        {
            let observers = self.observers.read();
            for (id, observer) in observers.iter() {
                if observer.kind != kind {
                    continue;
                }
                if observer.try_send(event.clone()) {
                    delivered += 1;
                } else {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut observers = self.observers.write();
            for id in to_remove {
                observers.remove(&id);
                warn!(%kind, observer = id.0, "observer fell behind; dropped");
            }
        }

        delivered
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for (_, feed) in self.feeds.get_mut().drain() {
            self.remote.unsubscribe(feed.subscription.id);
        }
    }
}

/// Owns one live remote subscription per entity kind and republishes its
/// snapshots to any number of observers.
///
/// Delivery is driven by [`pump`](Self::pump) on the event-loop thread;
/// nothing here blocks.
#[derive(Clone)]
pub struct SnapshotSubscriptionManager {
    shared: Arc<Shared>,
}

impl SnapshotSubscriptionManager {
    /// Create a new manager over `remote`.
    pub fn new(remote: Arc<dyn RemoteStore>, config: SubscriptionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                remote,
                config,
                feeds: Mutex::new(HashMap::new()),
                observers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                default_materialized: AtomicBool::new(false),
            }),
        }
    }

    /// Open an observer subscription for `kind`.
    ///
    /// Establishes the feed if none is live. If that fails, the handle's
    /// first event is [`SnapshotEvent::Broken`]. If the feed already has a
    /// snapshot, the handle receives it first.
    pub fn open(&self, kind: EntityKind) -> SnapshotHandle {
        let shared = &self.shared;
        let id = SubscriptionId(shared.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(shared.config.buffer_size.max(1));

        let mut feeds = shared.feeds.lock();
        if !feeds.contains_key(&kind) {
            if let Err(e) = shared.establish(&mut feeds, kind) {
                warn!(%kind, error = %e, "feed could not be established");
                let _ = sender.try_send(SnapshotEvent::Broken {
                    kind,
                    reason: FaultReason::Unreachable(e.to_string()),
                });
            }
        }
        if let Some(latest) = feeds.get(&kind).and_then(|f| f.latest.clone()) {
            let _ = sender.try_send(SnapshotEvent::Snapshot(latest));
        }
        shared
            .observers
            .write()
            .insert(id, Observer { kind, sender });
        debug!(%kind, observer = id.0, "observer opened");

        SnapshotHandle {
            id,
            kind,
            receiver,
            shared: Arc::downgrade(&self.shared),
            closed: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        }
    }

    /// Stop delivery to `handle`. Idempotent.
    pub fn close(&self, handle: &SnapshotHandle) {
        handle.close();
    }

    /// Re-establish a broken feed for `kind` if observers are waiting on it.
    ///
    /// Returns whether a feed is live afterwards. Failure is reported to the
    /// waiting observers as a fault; there is no automatic retry.
    pub fn reconnect(&self, kind: EntityKind) -> bool {
        let shared = &self.shared;
        let mut feeds = shared.feeds.lock();
        if feeds.contains_key(&kind) {
            return true;
        }
        if self.observer_count(kind) == 0 {
            return false;
        }
        match shared.establish(&mut feeds, kind) {
            Ok(()) => true,
            Err(e) => {
                warn!(%kind, error = %e, "reconnect failed");
                shared.broadcast(
                    kind,
                    SnapshotEvent::Broken {
                        kind,
                        reason: FaultReason::Unreachable(e.to_string()),
                    },
                );
                false
            }
        }
    }

    /// Drain every feed, converting remote events into snapshots and
    /// delivering them. Returns the number of events delivered.
    pub fn pump(&self) -> usize {
        let shared = &self.shared;
        let mut delivered = 0;
        let mut broken = Vec::new();

        let mut feeds = shared.feeds.lock();
        for (kind, feed) in feeds.iter_mut() {
            let kind = *kind;
            loop {
                let raw = match feed.subscription.receiver.try_recv() {
                    Ok(RemoteEvent::Snapshot(raw)) => raw,
                    Ok(RemoteEvent::Fault(message)) => {
                        broken.push((kind, FaultReason::StreamFault(message)));
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        broken.push((kind, FaultReason::StreamFault("stream closed".into())));
                        break;
                    }
                };
                match shared.decode(kind, raw) {
                    Ok(Decoded::Ready(snapshot)) => {
                        feed.latest = Some(snapshot.clone());
                        delivered += shared.broadcast(kind, SnapshotEvent::Snapshot(snapshot));
                    }
                    Ok(Decoded::Pending) => {}
                    Ok(Decoded::Absent) => {
                        // The cached profile no longer exists; the feed stays
                        // live and recovers if the document comes back.
                        feed.latest = None;
                        warn!(%kind, "profile absent after default was written");
                        delivered += shared.broadcast(
                            kind,
                            SnapshotEvent::Broken {
                                kind,
                                reason: FaultReason::ProfileAbsent,
                            },
                        );
                    }
                    Err(e) => {
                        let reason = match e {
                            SyncError::Deserialization(msg) | SyncError::Serialization(msg) => {
                                FaultReason::Undecodable(msg)
                            }
                            other => FaultReason::MaterializeFailed(other.to_string()),
                        };
                        broken.push((kind, reason));
                        break;
                    }
                }
            }
        }

        for (kind, reason) in broken {
            if let Some(feed) = feeds.remove(&kind) {
                shared.remote.unsubscribe(feed.subscription.id);
            }
            warn!(%kind, ?reason, "feed broken");
            delivered += shared.broadcast(kind, SnapshotEvent::Broken { kind, reason });
        }

        delivered
    }

    /// Last snapshot observed on the live feed for `kind`.
    pub fn latest(&self, kind: EntityKind) -> Option<Snapshot> {
        self.shared
            .feeds
            .lock()
            .get(&kind)
            .and_then(|f| f.latest.clone())
    }

    /// Whether a remote feed is currently open for `kind`.
    pub fn is_live(&self, kind: EntityKind) -> bool {
        self.shared.feeds.lock().contains_key(&kind)
    }

    /// Number of open observers for `kind`.
    pub fn observer_count(&self, kind: EntityKind) -> usize {
        self.shared
            .observers
            .read()
            .values()
            .filter(|o| o.kind == kind)
            .count()
    }

    /// Configuration this manager was built with.
    pub fn config(&self) -> &SubscriptionConfig {
        &self.shared.config
    }
}
