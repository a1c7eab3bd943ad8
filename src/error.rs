use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    InvalidDate(String),
    DuplicateSubject(String),
    InvalidSchedule(String),
    InvalidSubjectName(String),
    UnknownSubject(String),
    IndexOutOfRange {
        date: NaiveDate,
        kind: EntryKind,
        index: usize,
        len: usize,
    },
    FeatureDisabled(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Proxy,
    Extra,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Proxy => write!(f, "proxy"),
            EntryKind::Extra => write!(f, "extra"),
        }
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceError::InvalidDate(raw) => {
                write!(f, "invalid date: {raw}. Example: 2025-09-15")
            }
            AttendanceError::DuplicateSubject(name) => {
                write!(f, "subject already exists: {name}")
            }
            AttendanceError::InvalidSchedule(message) => write!(f, "invalid schedule: {message}"),
            AttendanceError::InvalidSubjectName(name) => {
                write!(f, "invalid subject name: {name:?}")
            }
            AttendanceError::UnknownSubject(name) => write!(f, "unknown subject: {name}"),
            AttendanceError::IndexOutOfRange {
                date,
                kind,
                index,
                len,
            } => write!(
                f,
                "{kind} lecture #{index} does not exist on {date} ({len} recorded)"
            ),
            AttendanceError::FeatureDisabled(feature) => {
                write!(f, "{feature} lectures are disabled in this configuration")
            }
        }
    }
}

impl std::error::Error for AttendanceError {}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
