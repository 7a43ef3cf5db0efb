//! Write coordinator: user intents turned into store writes.
//!
//! Each operation is a single atomic store call. There is no retry and no
//! queueing; a failure is returned once to the caller. Nothing here waits
//! for, or returns, the resulting state: it arrives later as a snapshot, and
//! possibly not in the very next one.

use crate::auth::Authenticator;
use crate::clock::Clock;
use crate::error::{Result, SyncError};
use crate::model::{HrRecordFields, HrRecordPatch, MessageFields, ProfilePatch};
use crate::remote::RemoteStore;
use crate::types::{CollectionKind, DocumentKey};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct WriteCoordinator {
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn Authenticator>,
    clock: Arc<dyn Clock>,
    profile_key: DocumentKey,
}

impl WriteCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            remote,
            auth,
            clock,
            profile_key: DocumentKey::profile(),
        }
    }

    pub fn with_profile_key(mut self, key: DocumentKey) -> Self {
        self.profile_key = key;
        self
    }

    fn require_admin(&self, op: &'static str) -> Result<()> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            warn!(op, "administrator action without sign-in");
            Err(SyncError::Permission(format!("{op} requires sign-in")))
        }
    }

    fn report<T>(op: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => debug!(op, "write accepted"),
            Err(e) => warn!(op, error = %e, "write failed"),
        }
        result
    }

    /// Merge-patch the profile. Only supplied fields are replaced; sequence
    /// fields are replaced wholesale. An empty patch writes nothing.
    pub fn update_profile(&self, patch: &ProfilePatch) -> Result<()> {
        self.require_admin("update_profile")?;
        if patch.is_empty() {
            return Ok(());
        }
        let fields = patch.to_fields()?;
        Self::report(
            "update_profile",
            self.remote.put_document(&self.profile_key, fields, true),
        )
    }

    /// Stamp and insert a visitor message. Open to unauthenticated callers.
    pub fn submit_message(&self, fields: &MessageFields) -> Result<()> {
        fields.validate()?;
        let record = fields.stamped(self.clock.now());
        Self::report(
            "submit_message",
            self.remote.insert(CollectionKind::Messages, record).map(|_| ()),
        )
    }

    pub fn remove_message(&self, id: &str) -> Result<()> {
        self.require_admin("remove_message")?;
        Self::report(
            "remove_message",
            self.remote.delete(CollectionKind::Messages, id),
        )
    }

    pub fn add_hr_record(&self, fields: &HrRecordFields) -> Result<()> {
        self.require_admin("add_hr_record")?;
        fields.validate()?;
        let record = fields.to_fields()?;
        Self::report(
            "add_hr_record",
            self.remote.insert(CollectionKind::HrRecords, record).map(|_| ()),
        )
    }

    /// Field-level merge; fields absent from `patch` are untouched.
    pub fn update_hr_record(&self, id: &str, patch: &HrRecordPatch) -> Result<()> {
        self.require_admin("update_hr_record")?;
        patch.validate()?;
        Self::report(
            "update_hr_record",
            self.remote
                .patch(CollectionKind::HrRecords, id, patch.to_fields()),
        )
    }

    pub fn remove_hr_record(&self, id: &str) -> Result<()> {
        self.require_admin("remove_hr_record")?;
        Self::report(
            "remove_hr_record",
            self.remote.delete(CollectionKind::HrRecords, id),
        )
    }
}
