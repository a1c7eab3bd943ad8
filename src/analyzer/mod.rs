pub mod report;

use crate::ledger::{AttendanceLedger, Status};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const GOOD_THRESHOLD: u32 = 75;
pub const WARNING_THRESHOLD: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub present: u32,
    pub total: u32,
    pub percent: u32,
}

impl SubjectStats {
    fn count(&mut self, status: Status) {
        match status {
            Status::Present => {
                self.present += 1;
                self.total += 1;
            }
            Status::Absent => self.total += 1,
            Status::Cancelled => {}
        }
    }

    fn finish(mut self) -> Self {
        self.percent = percent(self.present, self.total);
        self
    }

    pub fn standing(&self) -> Standing {
        Standing::from_percent(self.percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Good,
    Warning,
    Critical,
}

impl Standing {
    pub fn from_percent(percent: u32) -> Self {
        if percent >= GOOD_THRESHOLD {
            Standing::Good
        } else if percent >= WARNING_THRESHOLD {
            Standing::Warning
        } else {
            Standing::Critical
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Standing::Good => f.write_str("good"),
            Standing::Warning => f.write_str("warning"),
            Standing::Critical => f.write_str("critical"),
        }
    }
}

pub fn compute_stats(
    ledger: &AttendanceLedger,
    subjects: &BTreeSet<String>,
) -> BTreeMap<String, SubjectStats> {
    let mut stats = subjects
        .iter()
        .map(|subject| (subject.clone(), SubjectStats::default()))
        .collect::<BTreeMap<_, _>>();

    ledger.records().for_each(|(_, record)| {
        record.marks.iter().for_each(|(subject, status)| {
            if let Some(entry) = stats.get_mut(subject) {
                entry.count(*status);
            }
        });

        record.proxies.iter().for_each(|proxy| {
            if let Some(entry) = stats.get_mut(&proxy.replacement_subject) {
                entry.count(proxy.status);
            }
        });

        record.extras.iter().for_each(|extra| {
            if let Some(entry) = stats.get_mut(&extra.subject) {
                entry.count(extra.status);
            }
        });
    });

    stats
        .into_iter()
        .map(|(subject, entry)| (subject, entry.finish()))
        .collect()
}

pub fn percent(present: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }

    let present = u64::from(present);
    let total = u64::from(total);
    ((200 * present + total) / (2 * total)) as u32
}
