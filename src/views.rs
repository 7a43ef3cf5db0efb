//! Read-only projections over snapshots.
//!
//! Both functions borrow the snapshot and return references into it; the
//! stored values are never reordered or mutated.

use crate::model::{HrRecord, Message};
use std::cmp::Ordering;

/// Records with any attribute containing `query`, case-insensitively.
///
/// Every attribute is considered, including the id and both statuses. An
/// empty query matches everything. Linear in records × attributes.
pub fn filter_hr_records<'a>(records: &'a [HrRecord], query: &str) -> Vec<&'a HrRecord> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| {
            record
                .attribute_values()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Messages newest first.
///
/// Dates are compared as RFC 3339 instants. Unparseable dates sort after all
/// parseable ones, in descending lexical order among themselves. Ties keep no
/// particular order.
pub fn order_messages(messages: &[Message]) -> Vec<&Message> {
    let mut keyed: Vec<_> = messages.iter().map(|m| (m.timestamp(), m)).collect();
    keyed.sort_by(|(ta, a), (tb, b)| match (ta, tb) {
        (Some(ta), Some(tb)) => tb.cmp(ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.date.cmp(&a.date),
    });
    keyed.into_iter().map(|(_, m)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HrField, HrRecordFields};

    fn hr(id: &str, company: &str, remark: &str) -> HrRecord {
        let mut fields = HrRecordFields::default();
        fields.set(HrField::HrName, "Priya");
        fields.set(HrField::CompanyName, company);
        fields.set(HrField::Remark, remark);
        HrRecord {
            id: id.into(),
            fields,
        }
    }

    fn message(id: &str, date: &str) -> Message {
        Message {
            id: id.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_query_matches_all() {
        let records = vec![hr("1", "Acme", ""), hr("2", "Globex", "")];
        let filtered = filter_hr_records(&records, "");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0], &records[0]);
        assert_eq!(filtered[1], &records[1]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let records = vec![hr("1", "Acme", ""), hr("2", "Globex", "")];
        let filtered = filter_hr_records(&records, "acme");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");

        let filtered = filter_hr_records(&records, "GLOB");
        assert_eq!(filtered[0].id, "2");
    }

    #[test]
    fn test_matches_any_attribute_including_status_and_id() {
        let mut records = vec![hr("abc123", "Acme", ""), hr("2", "Globex", "call monday")];
        records[0].fields.set(HrField::FinalStatus, "Hold");

        assert_eq!(filter_hr_records(&records, "hold")[0].id, "abc123");
        assert_eq!(filter_hr_records(&records, "ABC1")[0].id, "abc123");
        assert_eq!(filter_hr_records(&records, "Monday")[0].id, "2");
        assert!(filter_hr_records(&records, "initech").is_empty());
    }

    #[test]
    fn test_order_messages_newest_first() {
        let messages = vec![
            message("a", "2024-01-02T00:00:00.000Z"),
            message("b", "2024-03-01T00:00:00.000Z"),
            message("c", "2023-12-31T23:59:59.999Z"),
        ];
        let ids: Vec<&str> = order_messages(&messages).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        // Input untouched.
        assert_eq!(messages[0].id, "a");
    }

    #[test]
    fn test_order_handles_offsets_and_bad_dates() {
        let messages = vec![
            message("bad", "yesterday"),
            message("utc", "2024-01-01T10:00:00Z"),
            message("offset", "2024-01-01T12:00:00+05:30"),
        ];
        let ids: Vec<&str> = order_messages(&messages).iter().map(|m| m.id.as_str()).collect();
        // 12:00+05:30 is 06:30Z, earlier than 10:00Z.
        assert_eq!(ids, vec!["utc", "offset", "bad"]);
    }
}
