//! Draft buffers in two sessions sharing one store.

use chrono::{TimeZone, Utc};
use folio::{
    Credentials, DocumentKey, DraftState, EducationField, ExperienceField, ManualClock,
    MemoryStore, Portfolio, PortfolioConfig, Profile, ProfileField, RemoteStore,
    StaticAuthenticator, SyncError,
};
use std::collections::HashSet;
use std::sync::Arc;

fn session(store: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> Portfolio {
    let auth = Arc::new(StaticAuthenticator::new(Credentials::new("admin", "pw")));
    let portfolio = Portfolio::open(
        store.clone(),
        auth,
        clock.clone(),
        PortfolioConfig::default(),
    );
    portfolio.login(&Credentials::new("admin", "pw")).unwrap();
    portfolio
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap(),
    ))
}

fn setup() -> (Arc<MemoryStore>, Portfolio, Portfolio) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let mut a = session(&store, &clock);
    a.tick();
    let mut b = session(&store, &clock);
    b.tick();
    (store, a, b)
}

fn stored_profile(store: &MemoryStore) -> Profile {
    Profile::from_fields(&store.document(&DocumentKey::profile()).unwrap()).unwrap()
}

#[test]
fn test_two_sessions_materialize_one_default() {
    let (store, a, b) = setup();
    assert_eq!(a.profile(), b.profile());
    // The second session subscribes after the default landed.
    assert_eq!(store.document_writes(), 1);
}

#[test]
fn test_dirty_draft_is_insulated_from_other_session() {
    let (_store, mut a, mut b) = setup();

    b.draft_mut().set_field(ProfileField::About, "B's words");
    a.draft_mut().set_field(ProfileField::Title, "A's title");
    a.save_draft().unwrap();

    a.tick();
    b.tick();

    assert_eq!(a.profile().title, "A's title");
    assert!(!a.draft().is_dirty());

    // B still sees its own edit and the old title.
    assert_eq!(b.draft().state(), DraftState::Dirty);
    assert_eq!(b.profile().about, "B's words");
    assert_ne!(b.profile().title, "A's title");
    assert_eq!(b.draft().latest_remote().unwrap().title, "A's title");
    assert!(b.draft().divergence().unwrap().is_some());
}

#[test]
fn test_commit_over_divergence_overwrites_and_reports() {
    let (store, mut a, mut b) = setup();

    b.draft_mut().set_field(ProfileField::About, "B's words");
    a.draft_mut().set_field(ProfileField::Title, "A's title");
    a.save_draft().unwrap();
    b.tick();

    let outcome = b.save_draft().unwrap();
    assert!(outcome.overwrote_remote_changes());

    // Whole-document commit: A's title is lost.
    let stored = stored_profile(&store);
    assert_eq!(stored.about, "B's words");
    assert_ne!(stored.title, "A's title");

    a.tick();
    assert_eq!(a.profile().about, "B's words");
}

#[test]
fn test_discard_takes_latest_remote() {
    let (_store, mut a, mut b) = setup();

    b.draft_mut().set_field(ProfileField::Name, "Draft name");
    a.draft_mut().set_field(ProfileField::Location, "Chennai");
    a.save_draft().unwrap();
    b.tick();

    b.discard_draft();
    assert_eq!(b.draft().state(), DraftState::Clean);
    assert_eq!(b.profile().location, "Chennai");
    assert_ne!(b.profile().name, "Draft name");
}

#[test]
fn test_failed_commit_keeps_edits() {
    let (store, mut a, _b) = setup();

    let id = a.draft_mut().add_experience();
    a.draft_mut()
        .update_experience(&id, ExperienceField::Role, "Staff Engineer")
        .unwrap();

    store.set_online(false);
    let err = a.save_draft().unwrap_err();
    assert!(matches!(err, SyncError::Connectivity(_)));
    assert!(a.draft().is_dirty());
    assert_eq!(a.profile().experience.last().unwrap().role, "Staff Engineer");

    store.set_online(true);
    a.save_draft().unwrap();
    a.tick();
    assert!(!a.draft().is_dirty());
    let stored = stored_profile(&store);
    assert_eq!(stored.experience.last().unwrap().id, id);
}

#[test]
fn test_sub_record_edits_reach_store_only_on_commit() {
    let (store, mut a, _b) = setup();
    let writes_before = store.document_writes();

    let edu = a.draft_mut().add_education();
    a.draft_mut()
        .update_education(&edu, EducationField::School, "IIT")
        .unwrap();
    a.draft_mut().remove_education("1").unwrap();
    let skill = a.draft_mut().add_skill("Rust");
    a.draft_mut().remove_skill(&skill).unwrap();
    assert_eq!(store.document_writes(), writes_before);

    a.save_draft().unwrap();
    let stored = stored_profile(&store);
    assert_eq!(stored.education.len(), 1);
    assert_eq!(stored.education[0].school, "IIT");
    assert!(!stored.skills.contains(&"Rust".to_string()));
}

#[test]
fn test_ids_distinct_within_one_tick() {
    let (_store, mut a, _b) = setup();
    let draft = a.draft_mut();
    let ids: HashSet<String> = (0..10)
        .flat_map(|_| [draft.add_experience(), draft.add_certificate()])
        .collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn test_edit_before_first_snapshot_keeps_stored_profile() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    store
        .put_document(
            &DocumentKey::profile(),
            Profile::default_document().to_fields().unwrap(),
            false,
        )
        .unwrap();
    let mut a = session(&store, &clock());

    a.draft_mut().set_field(ProfileField::Phone, "123");
    assert!(!a.draft().is_dirty());
    a.tick();
    assert!(a.draft().is_loaded());
    assert_eq!(a.profile().name, "Mukesh");

    a.save_draft().unwrap();
    let stored = stored_profile(&store);
    assert_eq!(stored.name, "Mukesh");
    assert!(!stored.skills.is_empty());
    assert!(!stored.experience.is_empty());
    assert_eq!(stored, Profile::default_document());
}

#[test]
fn test_commit_before_first_snapshot_is_refused() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    let mut a = session(&store, &clock());

    a.draft_mut().set_field(ProfileField::Name, "Too early");
    let err = a.save_draft().unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(store.document_writes(), 0);

    // Once loaded, the materialized default is what shows.
    a.tick();
    assert_eq!(a.profile().name, "Mukesh");
    assert_eq!(store.document_writes(), 1);
}
