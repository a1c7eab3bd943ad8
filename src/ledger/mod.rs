use crate::error::{AttendanceError, AttendanceResult, EntryKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Present,
    Absent,
    Cancelled,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "present" | "p" => Ok(Status::Present),
            "absent" | "a" => Ok(Status::Absent),
            "cancelled" | "canceled" | "c" => Ok(Status::Cancelled),
            _ => Err(format!(
                "unknown status: {raw}. Use present, absent or cancelled"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntry {
    #[serde(rename = "scheduled")]
    pub scheduled_subject: String,
    #[serde(rename = "replacement")]
    pub replacement_subject: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraEntry {
    pub subject: String,
    #[serde(default)]
    pub teacher: Option<String>,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<ProxyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<ExtraEntry>,
    #[serde(flatten)]
    pub marks: BTreeMap<String, Status>,
}

impl AttendanceRecord {
    pub fn status_of(&self, subject: &str) -> Option<Status> {
        self.marks.get(subject).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.proxies.is_empty() && self.extras.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceLedger {
    records: BTreeMap<NaiveDate, AttendanceRecord>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.records.get(&date)
    }

    pub fn records(&self) -> impl Iterator<Item = (NaiveDate, &AttendanceRecord)> {
        self.records.iter().map(|(date, record)| (*date, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn mark_regular(&mut self, date: NaiveDate, subject: &str, status: Status) {
        self.records
            .entry(date)
            .or_default()
            .marks
            .insert(subject.to_string(), status);
    }

    pub fn add_proxy(&mut self, date: NaiveDate, scheduled: &str, replacement: &str) -> bool {
        let replacement = replacement.trim();
        if replacement.is_empty() {
            return false;
        }

        self.records.entry(date).or_default().proxies.push(ProxyEntry {
            scheduled_subject: scheduled.to_string(),
            replacement_subject: replacement.to_string(),
            status: Status::Present,
        });

        true
    }

    pub fn set_proxy_status(
        &mut self,
        date: NaiveDate,
        index: usize,
        status: Status,
    ) -> AttendanceResult<()> {
        let len = self.record(date).map_or(0, |record| record.proxies.len());
        let entry = self
            .records
            .get_mut(&date)
            .and_then(|record| record.proxies.get_mut(index))
            .ok_or(AttendanceError::IndexOutOfRange {
                date,
                kind: EntryKind::Proxy,
                index,
                len,
            })?;

        entry.status = status;
        Ok(())
    }

    pub fn add_extra(&mut self, date: NaiveDate, subject: &str, teacher: Option<&str>) -> bool {
        let subject = subject.trim();
        if subject.is_empty() {
            return false;
        }

        let teacher = teacher
            .map(str::trim)
            .filter(|teacher| !teacher.is_empty())
            .map(ToOwned::to_owned);

        self.records.entry(date).or_default().extras.push(ExtraEntry {
            subject: subject.to_string(),
            teacher,
            status: Status::Present,
        });

        true
    }

    pub fn set_extra_status(
        &mut self,
        date: NaiveDate,
        index: usize,
        status: Status,
    ) -> AttendanceResult<()> {
        let len = self.record(date).map_or(0, |record| record.extras.len());
        let entry = self
            .records
            .get_mut(&date)
            .and_then(|record| record.extras.get_mut(index))
            .ok_or(AttendanceError::IndexOutOfRange {
                date,
                kind: EntryKind::Extra,
                index,
                len,
            })?;

        entry.status = status;
        Ok(())
    }

    pub fn cascade_delete_subject(&mut self, name: &str) -> usize {
        let removed = self
            .records
            .values_mut()
            .filter_map(|record| record.marks.remove(name))
            .count();

        self.records.retain(|_, record| !record.is_empty());
        removed
    }
}
