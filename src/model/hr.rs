//! Recruiter-outreach (HR) records.

use crate::error::{Result, SyncError};
use crate::remote::RemoteRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Status of an interview or of the outreach as a whole.
///
/// Stored as a bare string; the empty string means "not set". Values written
/// by other clients that fall outside the known set are kept verbatim so a
/// snapshot never fails to decode, but they are rejected on write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    #[default]
    Unset,
    Process,
    Complete,
    Pass,
    Fail,
    Hold,
    Other(String),
}

impl RecordStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RecordStatus::Unset => "",
            RecordStatus::Process => "Process",
            RecordStatus::Complete => "Complete",
            RecordStatus::Pass => "Pass",
            RecordStatus::Fail => "Fail",
            RecordStatus::Hold => "Hold",
            RecordStatus::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RecordStatus::Other(_))
    }

    /// Parse a status, rejecting anything outside the known set.
    pub fn parse(value: &str) -> Result<Self> {
        match RecordStatus::from(value.to_string()) {
            RecordStatus::Other(other) => Err(SyncError::Validation(format!(
                "unknown status '{other}'"
            ))),
            status => Ok(status),
        }
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => RecordStatus::Unset,
            "Process" => RecordStatus::Process,
            "Complete" => RecordStatus::Complete,
            "Pass" => RecordStatus::Pass,
            "Fail" => RecordStatus::Fail,
            "Hold" => RecordStatus::Hold,
            _ => RecordStatus::Other(value),
        }
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressable attributes of an HR record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HrField {
    HrName,
    ContactNo,
    CallingDate,
    CompanyName,
    Location,
    Package,
    JobRole,
    MailReceivedDate,
    MailRevertDate,
    InterviewStatus,
    InterviewDate,
    FinalStatus,
    Remark,
}

impl HrField {
    pub const ALL: [HrField; 13] = [
        HrField::HrName,
        HrField::ContactNo,
        HrField::CallingDate,
        HrField::CompanyName,
        HrField::Location,
        HrField::Package,
        HrField::JobRole,
        HrField::MailReceivedDate,
        HrField::MailRevertDate,
        HrField::InterviewStatus,
        HrField::InterviewDate,
        HrField::FinalStatus,
        HrField::Remark,
    ];

    /// Attribute name in the stored record.
    pub fn key(self) -> &'static str {
        match self {
            HrField::HrName => "hrName",
            HrField::ContactNo => "contactNo",
            HrField::CallingDate => "callingDate",
            HrField::CompanyName => "companyName",
            HrField::Location => "location",
            HrField::Package => "package",
            HrField::JobRole => "jobRole",
            HrField::MailReceivedDate => "mailReceivedDate",
            HrField::MailRevertDate => "mailRevertDate",
            HrField::InterviewStatus => "interviewStatus",
            HrField::InterviewDate => "interviewDate",
            HrField::FinalStatus => "finalStatus",
            HrField::Remark => "remark",
        }
    }

    pub fn is_status(self) -> bool {
        matches!(self, HrField::InterviewStatus | HrField::FinalStatus)
    }
}

/// Every attribute of an HR record except its id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HrRecordFields {
    pub hr_name: String,
    pub contact_no: String,
    pub calling_date: String,
    pub company_name: String,
    pub location: String,
    pub package: String,
    pub job_role: String,
    pub mail_received_date: String,
    pub mail_revert_date: String,
    pub interview_status: RecordStatus,
    pub interview_date: String,
    pub final_status: RecordStatus,
    pub remark: String,
}

impl HrRecordFields {
    /// Fresh entry form: interview in process, everything else empty.
    pub fn blank() -> Self {
        Self {
            interview_status: RecordStatus::Process,
            ..Default::default()
        }
    }

    pub fn get(&self, field: HrField) -> &str {
        match field {
            HrField::HrName => &self.hr_name,
            HrField::ContactNo => &self.contact_no,
            HrField::CallingDate => &self.calling_date,
            HrField::CompanyName => &self.company_name,
            HrField::Location => &self.location,
            HrField::Package => &self.package,
            HrField::JobRole => &self.job_role,
            HrField::MailReceivedDate => &self.mail_received_date,
            HrField::MailRevertDate => &self.mail_revert_date,
            HrField::InterviewStatus => self.interview_status.as_str(),
            HrField::InterviewDate => &self.interview_date,
            HrField::FinalStatus => self.final_status.as_str(),
            HrField::Remark => &self.remark,
        }
    }

    pub fn set(&mut self, field: HrField, value: impl Into<String>) {
        let value = value.into();
        match field {
            HrField::HrName => self.hr_name = value,
            HrField::ContactNo => self.contact_no = value,
            HrField::CallingDate => self.calling_date = value,
            HrField::CompanyName => self.company_name = value,
            HrField::Location => self.location = value,
            HrField::Package => self.package = value,
            HrField::JobRole => self.job_role = value,
            HrField::MailReceivedDate => self.mail_received_date = value,
            HrField::MailRevertDate => self.mail_revert_date = value,
            HrField::InterviewStatus => self.interview_status = value.into(),
            HrField::InterviewDate => self.interview_date = value,
            HrField::FinalStatus => self.final_status = value.into(),
            HrField::Remark => self.remark = value,
        }
    }

    /// `hrName` is required and both statuses must be in the known set.
    pub fn validate(&self) -> Result<()> {
        if self.hr_name.trim().is_empty() {
            return Err(SyncError::Validation(format!("{} is required", HrField::HrName.key())));
        }
        for status in [&self.interview_status, &self.final_status] {
            if !status.is_known() {
                return Err(SyncError::Validation(format!("unknown status '{status}'")));
            }
        }
        Ok(())
    }

    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SyncError::Serialization(format!(
                "hr record encoded as non-object: {other}"
            ))),
        }
    }
}

/// A stored HR record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HrRecord {
    /// Assigned by the store.
    pub id: String,
    #[serde(flatten)]
    pub fields: HrRecordFields,
}

impl HrRecord {
    pub fn from_record(record: &RemoteRecord) -> Result<Self> {
        let fields: HrRecordFields = serde_json::from_value(Value::Object(record.fields.clone()))
            .map_err(|e| SyncError::Deserialization(format!("hr record {}: {e}", record.id)))?;
        Ok(Self {
            id: record.id.clone(),
            fields,
        })
    }

    /// Prefill for an edit form.
    pub fn fields(&self) -> HrRecordFields {
        self.fields.clone()
    }

    /// String form of every attribute, id first.
    pub fn attribute_values(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.id.as_str()).chain(HrField::ALL.into_iter().map(|f| self.fields.get(f)))
    }
}

/// A field-level merge against one HR record. Unset fields are untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HrRecordPatch {
    changes: BTreeMap<HrField, String>,
}

impl HrRecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that rewrites every attribute from a filled-in form.
    pub fn from_fields(fields: &HrRecordFields) -> Self {
        let changes = HrField::ALL
            .into_iter()
            .map(|f| (f, fields.get(f).to_string()))
            .collect();
        Self { changes }
    }

    pub fn set(mut self, field: HrField, value: impl Into<String>) -> Self {
        self.changes.insert(field, value.into());
        self
    }

    pub fn get(&self, field: HrField) -> Option<&str> {
        self.changes.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Status values must be known; a patch may not blank out `hrName`.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in &self.changes {
            if field.is_status() {
                RecordStatus::parse(value)?;
            }
            if *field == HrField::HrName && value.trim().is_empty() {
                return Err(SyncError::Validation(format!("{} is required", field.key())));
            }
        }
        Ok(())
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        self.changes
            .iter()
            .map(|(field, value)| (field.key().to_string(), Value::String(value.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_strings() {
        assert_eq!(RecordStatus::from(String::new()), RecordStatus::Unset);
        assert_eq!(RecordStatus::from("Hold".to_string()), RecordStatus::Hold);
        assert_eq!(
            RecordStatus::from("Ghosted".to_string()),
            RecordStatus::Other("Ghosted".into())
        );
        assert!(RecordStatus::parse("Ghosted").is_err());
        assert_eq!(RecordStatus::parse("").unwrap(), RecordStatus::Unset);
    }

    #[test]
    fn test_decode_record_with_partial_fields() {
        let record = RemoteRecord {
            id: "r1".into(),
            fields: json!({"hrName": "Priya", "companyName": "Acme", "finalStatus": "Pass"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let hr = HrRecord::from_record(&record).unwrap();
        assert_eq!(hr.id, "r1");
        assert_eq!(hr.fields.company_name, "Acme");
        assert_eq!(hr.fields.final_status, RecordStatus::Pass);
        assert_eq!(hr.fields.interview_status, RecordStatus::Unset);
    }

    #[test]
    fn test_blank_form_defaults() {
        let blank = HrRecordFields::blank();
        assert_eq!(blank.interview_status, RecordStatus::Process);
        assert_eq!(blank.final_status, RecordStatus::Unset);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_patch_encodes_only_changes() {
        let patch = HrRecordPatch::new()
            .set(HrField::Remark, "call back")
            .set(HrField::FinalStatus, "Hold");
        let fields = patch.to_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["remark"], "call back");
        assert_eq!(fields["finalStatus"], "Hold");
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_patch_rejects_unknown_status() {
        let patch = HrRecordPatch::new().set(HrField::InterviewStatus, "Maybe");
        assert!(matches!(patch.validate(), Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_attribute_values_include_id() {
        let mut fields = HrRecordFields::blank();
        fields.set(HrField::HrName, "Priya");
        let hr = HrRecord {
            id: "abc".into(),
            fields,
        };
        let values: Vec<&str> = hr.attribute_values().collect();
        assert_eq!(values.len(), 14);
        assert_eq!(values[0], "abc");
        assert!(values.contains(&"Process"));
    }
}
