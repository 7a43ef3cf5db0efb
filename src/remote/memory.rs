//! In-memory document store.
//!
//! Applies the same merge semantics as the hosted store and pushes a fresh
//! full snapshot to every matching subscriber after each write. Useful as an
//! embedded backend and as the store behind the crate's tests; it can be
//! taken offline or made to break its live streams to exercise fault paths.

use super::{
    Query, RemoteEvent, RemoteRecord, RemoteSnapshot, RemoteStore, RemoteSubscription,
    RemoteSubscriptionId,
};
use crate::error::{Result, SyncError};
use crate::types::{CollectionKind, Direction, DocumentKey, OrderBy};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

struct Subscriber {
    query: Query,
    sender: Sender<RemoteEvent>,
}

#[derive(Default)]
struct MemoryState {
    documents: HashMap<DocumentKey, Map<String, Value>>,
    collections: HashMap<CollectionKind, BTreeMap<String, Map<String, Value>>>,
    subscribers: HashMap<RemoteSubscriptionId, Subscriber>,
}

impl MemoryState {
    fn snapshot(&self, query: &Query) -> RemoteSnapshot {
        match query {
            Query::Document(key) => RemoteSnapshot::Document(self.documents.get(key).cloned()),
            Query::Collection { collection, order } => {
                let mut records: Vec<RemoteRecord> = self
                    .collections
                    .get(collection)
                    .map(|records| {
                        records
                            .iter()
                            .map(|(id, fields)| RemoteRecord {
                                id: id.clone(),
                                fields: fields.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                if let Some(order) = order {
                    sort_records(&mut records, order);
                }
                RemoteSnapshot::Collection(records)
            }
        }
    }

    /// Push fresh snapshots to subscribers whose query `affected` accepts.
    fn notify<F>(&mut self, affected: F)
    where
        F: Fn(&Query) -> bool,
    {
        let mut gone = Vec::new();
        for (id, sub) in self.subscribers.iter() {
            if affected(&sub.query) {
                let event = RemoteEvent::Snapshot(self.snapshot(&sub.query));
                if sub.sender.send(event).is_err() {
                    gone.push(*id);
                }
            }
        }
        for id in gone {
            self.subscribers.remove(&id);
        }
    }

    fn notify_collection(&mut self, collection: CollectionKind) {
        self.notify(|q| matches!(q, Query::Collection { collection: c, .. } if *c == collection));
    }
}

fn sort_key(fields: &Map<String, Value>, field: &str) -> String {
    match fields.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn sort_records(records: &mut [RemoteRecord], order: &OrderBy) {
    records.sort_by(|a, b| {
        let ord = sort_key(&a.fields, &order.field).cmp(&sort_key(&b.fields, &order.field));
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
}

/// An in-memory [`RemoteStore`].
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    next_subscription: AtomicU64,
    next_record: AtomicU64,
    online: AtomicBool,
    /// Count of `put_document` calls that reached the store.
    document_writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            next_subscription: AtomicU64::new(1),
            next_record: AtomicU64::new(1),
            online: AtomicBool::new(true),
            document_writes: AtomicU64::new(0),
        }
    }

    /// Toggle reachability. While offline every operation fails with
    /// [`SyncError::Connectivity`]; live subscriptions stay attached.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Break every live stream: each subscriber receives one fault and is
    /// detached.
    pub fn break_streams(&self, reason: &str) {
        let mut state = self.state.lock();
        for (_, sub) in state.subscribers.drain() {
            let _ = sub.sender.send(RemoteEvent::Fault(reason.to_string()));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    pub fn document_writes(&self) -> u64 {
        self.document_writes.load(Ordering::SeqCst)
    }

    /// Current stored value of a document.
    pub fn document(&self, key: &DocumentKey) -> Option<Map<String, Value>> {
        self.state.lock().documents.get(key).cloned()
    }

    /// Delete a document outright, as an administrator console would.
    pub fn remove_document(&self, key: &DocumentKey) {
        let mut state = self.state.lock();
        if state.documents.remove(key).is_some() {
            state.notify(|q| matches!(q, Query::Document(k) if k == key));
        }
    }

    /// Current stored records of a collection, in id order.
    pub fn records(&self, collection: CollectionKind) -> Vec<RemoteRecord> {
        match self.state.lock().snapshot(&Query::Collection {
            collection,
            order: None,
        }) {
            RemoteSnapshot::Collection(records) => records,
            RemoteSnapshot::Document(_) => Vec::new(),
        }
    }

    fn ensure_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::Connectivity("memory store is offline".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, query: &Query) -> Result<RemoteSubscription> {
        self.ensure_online()?;

        let id = RemoteSubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = unbounded();

        let mut state = self.state.lock();
        let initial = state.snapshot(query);
        // Unbounded and the receiver is alive; this cannot fail.
        let _ = sender.send(RemoteEvent::Snapshot(initial));
        state.subscribers.insert(
            id,
            Subscriber {
                query: query.clone(),
                sender,
            },
        );
        debug!(subscription = id.0, kind = %query.kind(), "remote subscription opened");

        Ok(RemoteSubscription { id, receiver })
    }

    fn unsubscribe(&self, id: RemoteSubscriptionId) {
        if self.state.lock().subscribers.remove(&id).is_some() {
            debug!(subscription = id.0, "remote subscription closed");
        }
    }

    fn put_document(
        &self,
        key: &DocumentKey,
        fields: Map<String, Value>,
        merge: bool,
    ) -> Result<()> {
        self.ensure_online()?;
        self.document_writes.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        match state.documents.get_mut(key) {
            Some(existing) if merge => {
                for (field, value) in fields {
                    existing.insert(field, value);
                }
            }
            _ => {
                state.documents.insert(key.clone(), fields);
            }
        }
        state.notify(|q| matches!(q, Query::Document(k) if k == key));
        Ok(())
    }

    fn insert(&self, collection: CollectionKind, record: Map<String, Value>) -> Result<String> {
        self.ensure_online()?;

        let id = format!("rec{:06}", self.next_record.fetch_add(1, Ordering::SeqCst));
        let mut state = self.state.lock();
        state
            .collections
            .entry(collection)
            .or_default()
            .insert(id.clone(), record);
        state.notify_collection(collection);
        Ok(id)
    }

    fn patch(&self, collection: CollectionKind, id: &str, fields: Map<String, Value>) -> Result<()> {
        self.ensure_online()?;

        let mut state = self.state.lock();
        let existing = state
            .collections
            .get_mut(&collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| SyncError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        for (field, value) in fields {
            existing.insert(field, value);
        }
        state.notify_collection(collection);
        Ok(())
    }

    fn delete(&self, collection: CollectionKind, id: &str) -> Result<()> {
        self.ensure_online()?;

        let mut state = self.state.lock();
        let removed = state
            .collections
            .get_mut(&collection)
            .and_then(|records| records.remove(id));
        if removed.is_none() {
            return Err(SyncError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        state.notify_collection(collection);
        Ok(())
    }
}
