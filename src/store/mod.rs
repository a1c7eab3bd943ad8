pub mod http;
pub mod queries;
pub mod sqlite;

use crate::identity::UserHandle;
use crate::ledger::AttendanceLedger;
use crate::timetable::Timetable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use http::HttpStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable: Option<Timetable>,
    #[serde(default)]
    pub attendance: AttendanceLedger,
}

impl Snapshot {
    pub fn new(timetable: Timetable, attendance: AttendanceLedger) -> Self {
        Self {
            timetable: Some(timetable),
            attendance,
        }
    }

    pub fn from_document(document: Value) -> Result<Self> {
        serde_json::from_value(document).context("Failed to parse stored snapshot")
    }
}

pub trait RemoteStore: Send {
    fn read(&self, user: &UserHandle) -> Result<Option<Snapshot>>;

    // Other top-level fields of the stored document survive a write.
    fn write(&self, user: &UserHandle, snapshot: &Snapshot) -> Result<()>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    fn read(&self, user: &UserHandle) -> Result<Option<Snapshot>> {
        (**self).read(user)
    }

    fn write(&self, user: &UserHandle, snapshot: &Snapshot) -> Result<()> {
        (**self).write(user, snapshot)
    }
}

pub(crate) fn merge_document(existing: Option<Value>, snapshot: &Snapshot) -> Result<Value> {
    let update = serde_json::to_value(snapshot).context("Failed to serialize snapshot")?;

    let mut merged = match existing {
        Some(Value::Object(fields)) => fields,
        _ => Map::new(),
    };

    if let Value::Object(fields) = update {
        merged.extend(fields);
    }

    Ok(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Weekday;
    use serde_json::json;

    #[test]
    fn merge_keeps_unrelated_fields() {
        let existing = json!({
            "displayName": "Asha",
            "attendance": { "2025-09-15": { "DWM": "present" } }
        });
        let snapshot = Snapshot::new(
            Timetable::from_days([(Weekday::Monday, vec!["SDS"])]),
            AttendanceLedger::new(),
        );

        let merged = merge_document(Some(existing), &snapshot).unwrap();

        assert_eq!(
            merged,
            json!({
                "displayName": "Asha",
                "timetable": { "Monday": ["SDS"] },
                "attendance": {}
            })
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let snapshot = Snapshot::from_document(json!({ "displayName": "Asha" })).unwrap();

        assert!(snapshot.timetable.is_none());
        assert!(snapshot.attendance.is_empty());
    }
}
