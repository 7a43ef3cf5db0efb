//! # Folio
//!
//! Client-side sync layer for a personal portfolio backed by a live document
//! store: one profile document plus two collections, messages from visitors
//! and recruiter-outreach (HR) records.
//!
//! ## Core Concepts
//!
//! - **Snapshots**: Every remote change arrives as a full value, never a delta
//! - **Subscriptions**: One feed per entity kind, fanned out to observer handles
//! - **Writes**: Single atomic store calls; the result shows up as a later snapshot
//! - **Draft**: A local copy of the profile that stops following the remote once edited
//! - **Views**: Pure projections (HR search, newest-first messages) over snapshots
//!
//! ## Example
//!
//! ```ignore
//! use folio::{Portfolio, PortfolioConfig, MemoryStore, StaticAuthenticator, SystemClock};
//!
//! let mut portfolio = Portfolio::open(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticAuthenticator::new(Credentials::new("admin@x.com", "secret"))),
//!     Arc::new(SystemClock),
//!     PortfolioConfig::default(),
//! );
//!
//! // On each turn of the event loop
//! portfolio.tick();
//! println!("{} messages", portfolio.inbox_count());
//!
//! portfolio.draft_mut().set_field(ProfileField::Title, "Rust Developer");
//! portfolio.save_draft()?;
//! ```

pub mod auth;
pub mod clock;
pub mod draft;
pub mod error;
pub mod model;
pub mod portfolio;
pub mod remote;
pub mod subscriptions;
pub mod types;
pub mod upload;
pub mod views;
pub mod writes;

// Re-exports
pub use auth::{Authenticator, Credentials, StaticAuthenticator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use draft::{
    CommitOutcome, Divergence, DraftState, IdentityAllocator, ProfileDraftBuffer, SkillRef,
};
pub use error::{Result, SyncError};
pub use model::*;
pub use portfolio::{Portfolio, PortfolioConfig};
pub use remote::{
    MemoryStore, Query, RemoteEvent, RemoteRecord, RemoteSnapshot, RemoteStore,
    RemoteSubscription, RemoteSubscriptionId,
};
pub use subscriptions::{
    FaultReason, Snapshot, SnapshotEvent, SnapshotHandle, SnapshotSubscriptionManager,
    SubscriptionConfig, SubscriptionId,
};
pub use types::*;
pub use upload::{check_size, FileEncoder, Upload, DEFAULT_MAX_UPLOAD_BYTES};
pub use views::{filter_hr_records, order_messages};
pub use writes::WriteCoordinator;
