//! Visitor contact messages.

use crate::error::{Result, SyncError};
use crate::remote::RemoteRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored contact message. Immutable except for deletion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Assigned by the store.
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// ISO-8601 UTC, stamped at submission.
    pub date: String,
}

impl Message {
    pub fn from_record(record: &RemoteRecord) -> Result<Self> {
        let mut message: Message = serde_json::from_value(Value::Object(record.fields.clone()))
            .map_err(|e| SyncError::Deserialization(format!("message {}: {e}", record.id)))?;
        message.id = record.id.clone();
        Ok(message)
    }

    /// Parsed submission time, if the stored date is well-formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

/// What a visitor submits through the contact form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFields {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
}

impl MessageFields {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            message: message.into(),
        }
    }

    /// `name`, `email` and `message` are required; `phone` is optional.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::Validation(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// Record body to insert, with `date` stamped at `at`.
    pub fn stamped(&self, at: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(self.name.clone()));
        fields.insert("email".into(), Value::String(self.email.clone()));
        fields.insert("phone".into(), Value::String(self.phone.clone()));
        fields.insert("message".into(), Value::String(self.message.clone()));
        fields.insert(
            "date".into(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_required_fields() {
        assert!(MessageFields::new("A", "a@x.com", "", "hi").validate().is_ok());

        let err = MessageFields::new("A", "  ", "1", "hi").validate().unwrap_err();
        assert!(matches!(err, SyncError::Validation(ref f) if f == "email is required"));

        let err = MessageFields::new("A", "a@x.com", "1", "").validate().unwrap_err();
        assert!(matches!(err, SyncError::Validation(ref f) if f == "message is required"));
    }

    #[test]
    fn test_stamped_date_is_iso_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let fields = MessageFields::new("A", "a@x.com", "1", "hi").stamped(at);
        assert_eq!(fields["date"], "2024-03-01T12:30:00.000Z");
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn test_from_record_takes_store_id() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let record = RemoteRecord {
            id: "m-7".into(),
            fields: MessageFields::new("A", "a@x.com", "1", "hi").stamped(at),
        };
        let message = Message::from_record(&record).unwrap();
        assert_eq!(message.id, "m-7");
        assert_eq!(message.timestamp(), Some(at));
    }
}
