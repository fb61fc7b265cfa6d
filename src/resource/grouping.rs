//! Open/resolved split for inbound queries.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::Resource;

/// Items split by status, newest upload first in each group.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    pub open: Vec<T>,
    pub resolved: Vec<T>,
}

/// Split items into open (active) and resolved, each sorted by upload time descending.
///
/// Items without a parseable upload time sort last.
pub fn group_by_status<T: Resource>(items: &[T]) -> Grouped<T> {
    let (mut open, mut resolved): (Vec<T>, Vec<T>) =
        items.iter().cloned().partition(|item| item.is_active());
    open.sort_by_key(|item| std::cmp::Reverse(uploaded_at(item)));
    resolved.sort_by_key(|item| std::cmp::Reverse(uploaded_at(item)));
    Grouped { open, resolved }
}

fn uploaded_at<T: Resource>(item: &T) -> Option<DateTime<Utc>> {
    let raw = item.uploaded_on()?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Enquiry, Record};

    fn enquiry(id: &str, active: bool, uploaded_on: Option<&str>) -> Enquiry {
        Enquiry {
            record: Record {
                uploaded_on: uploaded_on.map(str::to_string),
                ..Record::with_id(id, active)
            },
            name: None,
            mobileno: None,
            email: None,
            purpose_id: None,
            purpose_name: None,
            message: None,
        }
    }

    #[test]
    fn test_groups_sorted_newest_first() {
        let items = vec![
            enquiry("a", true, Some("2024-01-01T10:00:00Z")),
            enquiry("b", false, Some("2024-03-01T10:00:00Z")),
            enquiry("c", true, Some("2024-02-01T10:00:00.000Z")),
            enquiry("d", true, None),
            enquiry("e", false, Some("2024-01-15 08:30:00")),
        ];

        let grouped = group_by_status(&items);
        let ids = |v: &[Enquiry]| v.iter().map(|e| e.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&grouped.open), vec!["c", "a", "d"]);
        assert_eq!(ids(&grouped.resolved), vec!["b", "e"]);
    }
}
