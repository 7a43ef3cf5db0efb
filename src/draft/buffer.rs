//! Profile draft buffer: a staging copy of the profile used while editing.

use super::identity::IdentityAllocator;
use crate::clock::Clock;
use crate::error::{Result, SyncError};
use crate::model::{
    Certificate, CertificateField, Education, EducationField, Experience, ExperienceField,
    Profile, ProfileField, ProfilePatch, SubRecord,
};
use crate::types::Fingerprint;
use crate::upload::{check_size, FileEncoder, Upload};
use crate::writes::WriteCoordinator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether the draft still mirrors the remote profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftState {
    /// Mirrors the latest snapshot; replaced on every new one.
    Clean,
    /// Edited; inbound snapshots no longer touch the visible draft.
    Dirty,
}

/// The remote profile changed after the current edit began.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    /// Fingerprint of the remote value the edit started from, if any.
    pub base: Option<Fingerprint>,
    /// Fingerprint of the latest remote value.
    pub remote: Fingerprint,
}

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Set when the commit replaced remote changes made after the edit
    /// began. The write still happened; callers may warn.
    pub overwritten: Option<Divergence>,
}

impl CommitOutcome {
    pub fn overwrote_remote_changes(&self) -> bool {
        self.overwritten.is_some()
    }
}

/// A skill in the draft, with its session-local id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

fn find_entry<'a, T: SubRecord>(entries: &'a mut [T], id: &str) -> Result<&'a mut T> {
    entries
        .iter_mut()
        .find(|e| e.id() == id)
        .ok_or_else(|| SyncError::DraftEntryNotFound(id.to_string()))
}

fn entry_position<T: SubRecord>(entries: &[T], id: &str) -> Result<usize> {
    entries
        .iter()
        .position(|e| e.id() == id)
        .ok_or_else(|| SyncError::DraftEntryNotFound(id.to_string()))
}

/// A session-scoped working copy of the profile.
///
/// While clean, every snapshot replaces the draft wholesale. The first edit
/// makes it dirty; from then on snapshots only update the tracked remote
/// value, and the visible draft changes only through edits, [`commit`] or
/// [`discard`]. Sub-record edits stay local until the next whole-document
/// commit.
///
/// Until the first snapshot arrives the buffer is unloaded: edits are
/// allowed but do not dirty it, and [`commit`] is refused.
///
/// [`commit`]: Self::commit
/// [`discard`]: Self::discard
pub struct ProfileDraftBuffer {
    state: DraftState,
    draft: Profile,
    /// Parallel to `draft.skills`.
    skill_ids: Vec<String>,
    /// Remote value the draft was loaded from.
    base: Option<Arc<Profile>>,
    latest_remote: Option<Arc<Profile>>,
    ids: IdentityAllocator,
}

impl ProfileDraftBuffer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: DraftState::Clean,
            draft: Profile::default(),
            skill_ids: Vec::new(),
            base: None,
            latest_remote: None,
            ids: IdentityAllocator::new(clock),
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DraftState::Dirty
    }

    /// Whether a remote profile has been observed yet.
    pub fn is_loaded(&self) -> bool {
        self.latest_remote.is_some()
    }

    /// The visible draft.
    pub fn profile(&self) -> &Profile {
        &self.draft
    }

    /// Latest remote profile observed, regardless of state.
    pub fn latest_remote(&self) -> Option<&Arc<Profile>> {
        self.latest_remote.as_ref()
    }

    /// Feed an inbound snapshot. Returns whether the visible draft changed.
    pub fn apply_snapshot(&mut self, snapshot: Arc<Profile>) -> bool {
        self.latest_remote = Some(Arc::clone(&snapshot));
        match self.state {
            DraftState::Clean => {
                self.load(snapshot);
                true
            }
            DraftState::Dirty => {
                match self.divergence() {
                    Ok(Some(divergence)) => debug!(
                        remote = %divergence.remote.short(),
                        "remote profile changed under a dirty draft"
                    ),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "could not fingerprint remote profile"),
                }
                false
            }
        }
    }

    /// Remote changes made since the current edit began, if any.
    ///
    /// Always `None` while clean.
    pub fn divergence(&self) -> Result<Option<Divergence>> {
        if self.state == DraftState::Clean {
            return Ok(None);
        }
        let Some(latest) = self.latest_remote.as_ref() else {
            return Ok(None);
        };
        let unchanged = match &self.base {
            Some(base) => Arc::ptr_eq(base, latest) || **base == **latest,
            None => false,
        };
        if unchanged {
            return Ok(None);
        }
        Ok(Some(Divergence {
            base: self.base.as_deref().map(Fingerprint::of).transpose()?,
            remote: Fingerprint::of(&**latest)?,
        }))
    }

    /// Write the whole draft as a profile merge-patch.
    ///
    /// On success the draft is clean again and is replaced by the next
    /// snapshot. On failure it stays dirty and nothing is lost. Remote
    /// changes made since the edit began are overwritten; the outcome says so.
    ///
    /// Refused with [`SyncError::Validation`] until the first snapshot has
    /// loaded, so a blank draft never replaces the stored profile.
    pub fn commit(&mut self, writes: &WriteCoordinator) -> Result<CommitOutcome> {
        if !self.is_loaded() {
            return Err(SyncError::Validation("profile not loaded yet".into()));
        }
        let overwritten = self.divergence()?;
        writes.update_profile(&ProfilePatch::full(&self.draft))?;

        if let Some(ref d) = overwritten {
            warn!(
                remote = %d.remote.short(),
                "draft committed over newer remote changes"
            );
        }
        self.state = DraftState::Clean;
        self.base = self.latest_remote.clone();
        debug!("draft committed");
        Ok(CommitOutcome { overwritten })
    }

    /// Drop every edit and reload from the latest remote profile.
    pub fn discard(&mut self) {
        match self.latest_remote.clone() {
            Some(latest) => self.load(latest),
            None => {
                self.draft = Profile::default();
                self.skill_ids.clear();
                self.base = None;
            }
        }
        self.state = DraftState::Clean;
        debug!("draft discarded");
    }

    fn load(&mut self, snapshot: Arc<Profile>) {
        let previous = std::mem::take(&mut self.skill_ids);
        let old_skills = std::mem::take(&mut self.draft.skills);
        self.draft = (*snapshot).clone();
        // Keep ids for skills that did not move so open editors stay valid.
        self.skill_ids = self
            .draft
            .skills
            .iter()
            .enumerate()
            .map(|(i, name)| match (previous.get(i), old_skills.get(i)) {
                (Some(id), Some(old)) if old == name => id.clone(),
                _ => self.ids.next_id(),
            })
            .collect();
        self.base = Some(snapshot);
    }

    fn edit(&mut self) -> &mut Profile {
        if !self.is_loaded() {
            // The first snapshot replaces whatever is edited before it.
            debug!("edit before profile loaded; draft stays clean");
            return &mut self.draft;
        }
        if self.state == DraftState::Clean {
            debug!("draft dirty");
        }
        self.state = DraftState::Dirty;
        &mut self.draft
    }

    // --- Scalar fields ---

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        *self.edit().field_mut(field) = value.into();
    }

    /// Encode `upload` into the photo field. Oversize uploads leave the
    /// draft untouched.
    pub fn attach_photo(
        &mut self,
        encoder: &dyn FileEncoder,
        upload: &Upload,
        max_bytes: usize,
    ) -> Result<()> {
        self.attach(ProfileField::PhotoUrl, encoder, upload, max_bytes)
    }

    /// Encode `upload` into the resume field.
    pub fn attach_resume(
        &mut self,
        encoder: &dyn FileEncoder,
        upload: &Upload,
        max_bytes: usize,
    ) -> Result<()> {
        self.attach(ProfileField::ResumeUrl, encoder, upload, max_bytes)
    }

    fn attach(
        &mut self,
        field: ProfileField,
        encoder: &dyn FileEncoder,
        upload: &Upload,
        max_bytes: usize,
    ) -> Result<()> {
        check_size(upload, max_bytes)?;
        let encoded = encoder.encode(upload, max_bytes)?;
        self.set_field(field, encoded);
        Ok(())
    }

    // --- Experience ---

    /// Append a blank entry and return its id.
    pub fn add_experience(&mut self) -> String {
        let id = self.ids.next_id();
        self.edit().experience.push(Experience::blank(id.clone()));
        id
    }

    pub fn update_experience(
        &mut self,
        id: &str,
        field: ExperienceField,
        value: impl Into<String>,
    ) -> Result<()> {
        find_entry(&mut self.draft.experience, id)?;
        find_entry(&mut self.edit().experience, id)?.set(field, value.into());
        Ok(())
    }

    pub fn remove_experience(&mut self, id: &str) -> Result<()> {
        let pos = entry_position(&self.draft.experience, id)?;
        self.edit().experience.remove(pos);
        Ok(())
    }

    // --- Education ---

    pub fn add_education(&mut self) -> String {
        let id = self.ids.next_id();
        self.edit().education.push(Education::blank(id.clone()));
        id
    }

    pub fn update_education(
        &mut self,
        id: &str,
        field: EducationField,
        value: impl Into<String>,
    ) -> Result<()> {
        find_entry(&mut self.draft.education, id)?;
        find_entry(&mut self.edit().education, id)?.set(field, value.into());
        Ok(())
    }

    pub fn remove_education(&mut self, id: &str) -> Result<()> {
        let pos = entry_position(&self.draft.education, id)?;
        self.edit().education.remove(pos);
        Ok(())
    }

    // --- Certificates ---

    pub fn add_certificate(&mut self) -> String {
        let id = self.ids.next_id();
        self.edit().certificates.push(Certificate::blank(id.clone()));
        id
    }

    pub fn update_certificate(
        &mut self,
        id: &str,
        field: CertificateField,
        value: impl Into<String>,
    ) -> Result<()> {
        find_entry(&mut self.draft.certificates, id)?;
        find_entry(&mut self.edit().certificates, id)?.set(field, value.into());
        Ok(())
    }

    pub fn remove_certificate(&mut self, id: &str) -> Result<()> {
        let pos = entry_position(&self.draft.certificates, id)?;
        self.edit().certificates.remove(pos);
        Ok(())
    }

    // --- Skills ---

    pub fn skills(&self) -> Vec<SkillRef<'_>> {
        self.skill_ids
            .iter()
            .zip(&self.draft.skills)
            .map(|(id, name)| SkillRef { id, name })
            .collect()
    }

    pub fn add_skill(&mut self, name: impl Into<String>) -> String {
        let id = self.ids.next_id();
        self.edit().skills.push(name.into());
        self.skill_ids.push(id.clone());
        id
    }

    pub fn update_skill(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        let pos = self.skill_position(id)?;
        self.edit().skills[pos] = name.into();
        Ok(())
    }

    pub fn remove_skill(&mut self, id: &str) -> Result<()> {
        let pos = self.skill_position(id)?;
        self.edit().skills.remove(pos);
        self.skill_ids.remove(pos);
        Ok(())
    }

    fn skill_position(&self, id: &str) -> Result<usize> {
        self.skill_ids
            .iter()
            .position(|s| s == id)
            .ok_or_else(|| SyncError::DraftEntryNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, Credentials, StaticAuthenticator};
    use crate::clock::ManualClock;
    use crate::remote::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn buffer() -> ProfileDraftBuffer {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        ProfileDraftBuffer::new(clock)
    }

    fn remote(name: &str) -> Arc<Profile> {
        Arc::new(Profile {
            name: name.into(),
            ..Profile::default_document()
        })
    }

    #[test]
    fn test_clean_mirrors_every_snapshot() {
        let mut draft = buffer();
        assert!(draft.apply_snapshot(remote("A")));
        assert_eq!(draft.profile().name, "A");
        assert!(draft.apply_snapshot(remote("B")));
        assert_eq!(draft.profile().name, "B");
        assert_eq!(draft.state(), DraftState::Clean);
        assert!(draft.divergence().unwrap().is_none());
    }

    #[test]
    fn test_unloaded_draft_stays_clean_and_refuses_commit() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let auth = Arc::new(StaticAuthenticator::new(Credentials::new("admin", "pw")));
        auth.login(&Credentials::new("admin", "pw")).unwrap();
        let writes = WriteCoordinator::new(store.clone(), auth, clock.clone());

        let mut draft = ProfileDraftBuffer::new(clock);
        assert!(!draft.is_loaded());
        draft.set_field(ProfileField::Phone, "123");
        draft.add_skill("Rust");
        assert_eq!(draft.state(), DraftState::Clean);

        let err = draft.commit(&writes).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(store.document_writes(), 0);

        // The first snapshot replaces the pre-load edits.
        draft.apply_snapshot(remote("A"));
        assert!(draft.is_loaded());
        assert_eq!(draft.profile().name, "A");
        assert_eq!(draft.profile().phone, Profile::default_document().phone);
        draft.set_field(ProfileField::Phone, "123");
        assert!(draft.is_dirty());
    }

    #[test]
    fn test_dirty_ignores_snapshots_but_tracks_remote() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        draft.set_field(ProfileField::Title, "Editing");
        assert!(draft.is_dirty());
        assert!(draft.divergence().unwrap().is_none());

        assert!(!draft.apply_snapshot(remote("B")));
        assert_eq!(draft.profile().name, "A");
        assert_eq!(draft.profile().title, "Editing");
        assert_eq!(draft.latest_remote().unwrap().name, "B");

        let divergence = draft.divergence().unwrap().unwrap();
        assert_eq!(divergence.base, Some(Fingerprint::of(&*remote("A")).unwrap()));
        assert_eq!(divergence.remote, Fingerprint::of(&*remote("B")).unwrap());
    }

    #[test]
    fn test_identical_snapshot_is_not_divergence() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        draft.set_field(ProfileField::About, "x");
        draft.apply_snapshot(remote("A"));
        assert!(draft.divergence().unwrap().is_none());
    }

    #[test]
    fn test_discard_reloads_latest_remote() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        draft.set_field(ProfileField::Name, "Mine");
        draft.apply_snapshot(remote("B"));

        draft.discard();
        assert_eq!(draft.state(), DraftState::Clean);
        assert_eq!(draft.profile().name, "B");
    }

    #[test]
    fn test_sub_record_ids_unique_at_same_instant() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        let a = draft.add_experience();
        let b = draft.add_experience();
        let c = draft.add_education();
        let d = draft.add_certificate();
        let ids = [&a, &b, &c, &d];
        for (i, x) in ids.iter().enumerate() {
            for y in &ids[i + 1..] {
                assert_ne!(x, y);
            }
        }
        assert_eq!(draft.profile().experience.len(), 4);
    }

    #[test]
    fn test_update_and_remove_sub_records() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));

        let id = draft.add_experience();
        draft
            .update_experience(&id, ExperienceField::Company, "Initech")
            .unwrap();
        let added = draft.profile().experience.last().unwrap();
        assert_eq!(added.company, "Initech");

        draft.update_education("1", EducationField::Year, "2020").unwrap();
        assert_eq!(draft.profile().education[0].year, "2020");

        draft.remove_certificate("1").unwrap();
        assert!(draft.profile().certificates.is_empty());

        let err = draft.remove_experience("missing").unwrap_err();
        assert!(matches!(err, SyncError::DraftEntryNotFound(_)));
    }

    #[test]
    fn test_failed_lookup_does_not_dirty() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        assert!(draft
            .update_certificate("missing", CertificateField::Name, "x")
            .is_err());
        assert_eq!(draft.state(), DraftState::Clean);
    }

    #[test]
    fn test_skills_have_stable_ids() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        let before: Vec<String> = draft.skills().iter().map(|s| s.id.to_string()).collect();
        assert_eq!(before.len(), 7);

        // Removing the first skill must not shift the identity of the rest.
        draft.remove_skill(&before[0]).unwrap();
        draft.update_skill(&before[2], "Axum").unwrap();
        let skills = draft.skills();
        assert_eq!(skills[0].id, before[1]);
        assert_eq!(skills[1].id, before[2]);
        assert_eq!(skills[1].name, "Axum");
        assert_eq!(draft.profile().skills[1], "Axum");

        let added = draft.add_skill("Rust");
        assert_eq!(draft.skills().last().unwrap().id, added);
        assert_eq!(draft.profile().skills.last().unwrap(), "Rust");
    }

    #[test]
    fn test_skill_ids_survive_unchanged_snapshot() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));
        let before: Vec<String> = draft.skills().iter().map(|s| s.id.to_string()).collect();
        draft.apply_snapshot(remote("B"));
        let after: Vec<String> = draft.skills().iter().map(|s| s.id.to_string()).collect();
        assert_eq!(before, after);
    }

    struct Tagged;

    impl FileEncoder for Tagged {
        fn encode(&self, upload: &Upload, _max_bytes: usize) -> Result<String> {
            Ok(format!("data:{};len={}", upload.content_type, upload.size()))
        }
    }

    #[test]
    fn test_attach_respects_limit() {
        let mut draft = buffer();
        draft.apply_snapshot(remote("A"));

        let big = Upload::new("me.png", "image/png", vec![0; 11]);
        let err = draft.attach_photo(&Tagged, &big, 10).unwrap_err();
        assert!(matches!(err, SyncError::SizeExceeded { size: 11, limit: 10 }));
        assert_eq!(draft.state(), DraftState::Clean);

        let cv = Upload::new("cv.pdf", "application/pdf", vec![0; 4]);
        draft.attach_resume(&Tagged, &cv, 10).unwrap();
        assert_eq!(draft.profile().resume_url, "data:application/pdf;len=4");
        assert!(draft.is_dirty());
    }
}
