//! Entity values as they are stored remotely.

mod hr;
mod message;
mod profile;

pub use hr::{HrField, HrRecord, HrRecordFields, HrRecordPatch, RecordStatus};
pub use message::{Message, MessageFields};
pub use profile::{
    Certificate, CertificateField, Education, EducationField, Experience, ExperienceField,
    Profile, ProfileField, ProfilePatch, SubRecord,
};
