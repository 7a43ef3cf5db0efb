//! Editing sessions over the profile.
//!
//! A [`ProfileDraftBuffer`] stages edits locally and writes them as one
//! merge-patch on commit. New sub-records get ids from an
//! [`IdentityAllocator`] owned by the buffer.

mod buffer;
mod identity;

pub use buffer::{CommitOutcome, DraftState, Divergence, ProfileDraftBuffer, SkillRef};
pub use identity::IdentityAllocator;
