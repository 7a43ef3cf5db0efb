//! A portfolio session: live feeds, the profile draft and the derived views
//! wired together for one user.

use crate::auth::{Authenticator, Credentials};
use crate::clock::Clock;
use crate::draft::{CommitOutcome, ProfileDraftBuffer};
use crate::error::Result;
use crate::model::{HrRecord, Message, Profile};
use crate::remote::RemoteStore;
use crate::subscriptions::{
    FaultReason, Snapshot, SnapshotEvent, SnapshotHandle, SnapshotSubscriptionManager,
    SubscriptionConfig,
};
use crate::types::EntityKind;
use crate::upload::{FileEncoder, Upload, DEFAULT_MAX_UPLOAD_BYTES};
use crate::views::{filter_hr_records, order_messages};
use crate::writes::WriteCoordinator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for a [`Portfolio`] session.
#[derive(Clone, Debug)]
pub struct PortfolioConfig {
    pub subscriptions: SubscriptionConfig,

    /// Largest photo or resume accepted.
    /// Default: 2 MiB
    pub max_upload_bytes: usize,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            subscriptions: SubscriptionConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// One user's view of the portfolio.
///
/// Opening a session subscribes to all three entity kinds. Call
/// [`tick`](Self::tick) from the event loop to take in new snapshots; the
/// profile goes through the draft buffer, the collections are cached as the
/// latest full value.
pub struct Portfolio {
    config: PortfolioConfig,
    manager: SnapshotSubscriptionManager,
    writes: WriteCoordinator,
    auth: Arc<dyn Authenticator>,
    profile_feed: SnapshotHandle,
    message_feed: SnapshotHandle,
    hr_feed: SnapshotHandle,
    draft: ProfileDraftBuffer,
    messages: Arc<[Message]>,
    hr_records: Arc<[HrRecord]>,
    faults: HashMap<EntityKind, FaultReason>,
}

impl Portfolio {
    pub fn open(
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
        config: PortfolioConfig,
    ) -> Self {
        let manager = SnapshotSubscriptionManager::new(remote.clone(), config.subscriptions.clone());
        let writes = WriteCoordinator::new(remote, auth.clone(), clock.clone())
            .with_profile_key(config.subscriptions.profile_key.clone());

        Self {
            profile_feed: manager.open(EntityKind::Profile),
            message_feed: manager.open(EntityKind::Message),
            hr_feed: manager.open(EntityKind::HrRecord),
            manager,
            writes,
            auth,
            draft: ProfileDraftBuffer::new(clock),
            messages: Arc::from(Vec::new()),
            hr_records: Arc::from(Vec::new()),
            faults: HashMap::new(),
            config,
        }
    }

    /// Pump the feeds and apply everything delivered. Returns the number of
    /// events applied.
    pub fn tick(&mut self) -> usize {
        self.manager.pump();
        let mut applied = 0;
        for kind in EntityKind::ALL {
            let events = self.feed(kind).drain();
            for event in events {
                self.apply(event);
                applied += 1;
            }
        }
        applied
    }

    fn feed(&self, kind: EntityKind) -> &SnapshotHandle {
        match kind {
            EntityKind::Profile => &self.profile_feed,
            EntityKind::Message => &self.message_feed,
            EntityKind::HrRecord => &self.hr_feed,
        }
    }

    fn feed_mut(&mut self, kind: EntityKind) -> &mut SnapshotHandle {
        match kind {
            EntityKind::Profile => &mut self.profile_feed,
            EntityKind::Message => &mut self.message_feed,
            EntityKind::HrRecord => &mut self.hr_feed,
        }
    }

    fn apply(&mut self, event: SnapshotEvent) {
        match event {
            SnapshotEvent::Snapshot(snapshot) => {
                if self.faults.remove(&snapshot.kind()).is_some() {
                    info!(kind = %snapshot.kind(), "feed recovered");
                }
                match snapshot {
                    Snapshot::Profile(profile) => {
                        self.draft.apply_snapshot(profile);
                    }
                    Snapshot::Messages(messages) => self.messages = messages,
                    Snapshot::HrRecords(records) => self.hr_records = records,
                }
            }
            SnapshotEvent::Broken { kind, reason } => {
                if reason == FaultReason::Lagged {
                    // The old handle is dead; a fresh one starts from the
                    // cached snapshot.
                    let handle = self.manager.open(kind);
                    *self.feed_mut(kind) = handle;
                }
                debug!(%kind, ?reason, "fault recorded");
                self.faults.insert(kind, reason);
            }
        }
    }

    /// Re-establish a broken feed. The fault clears once a snapshot arrives.
    pub fn reconnect(&mut self, kind: EntityKind) -> bool {
        self.manager.reconnect(kind)
    }

    /// Most recent unrecovered fault for `kind`.
    pub fn last_fault(&self, kind: EntityKind) -> Option<&FaultReason> {
        self.faults.get(&kind)
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    // --- Views ---

    /// The profile as currently shown: the draft, which mirrors the remote
    /// value until it is edited.
    pub fn profile(&self) -> &Profile {
        self.draft.profile()
    }

    /// Messages, newest first.
    pub fn messages(&self) -> Vec<&Message> {
        order_messages(&self.messages)
    }

    pub fn inbox_count(&self) -> usize {
        self.messages.len()
    }

    /// HR records matching `query`; `""` returns all.
    pub fn hr_records(&self, query: &str) -> Vec<&HrRecord> {
        filter_hr_records(&self.hr_records, query)
    }

    /// A stored record by id, for prefilling an edit form.
    pub fn hr_record(&self, id: &str) -> Option<&HrRecord> {
        self.hr_records.iter().find(|r| r.id == id)
    }

    // --- Administrator ---

    pub fn login(&self, credentials: &Credentials) -> Result<()> {
        self.auth.login(credentials)
    }

    pub fn logout(&self) {
        self.auth.logout();
    }

    pub fn is_admin(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Direct writes. Their effect shows up on a later tick.
    pub fn writes(&self) -> &WriteCoordinator {
        &self.writes
    }

    // --- Draft ---

    pub fn draft(&self) -> &ProfileDraftBuffer {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProfileDraftBuffer {
        &mut self.draft
    }

    pub fn save_draft(&mut self) -> Result<CommitOutcome> {
        self.draft.commit(&self.writes)
    }

    pub fn discard_draft(&mut self) {
        self.draft.discard();
    }

    /// Attach a photo under the session's upload limit.
    pub fn attach_photo(&mut self, encoder: &dyn FileEncoder, upload: &Upload) -> Result<()> {
        let limit = self.config.max_upload_bytes;
        self.draft.attach_photo(encoder, upload, limit)
    }

    /// Attach a resume under the session's upload limit.
    pub fn attach_resume(&mut self, encoder: &dyn FileEncoder, upload: &Upload) -> Result<()> {
        let limit = self.config.max_upload_bytes;
        self.draft.attach_resume(encoder, upload, limit)
    }
}
