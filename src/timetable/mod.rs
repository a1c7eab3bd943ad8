use crate::calendar::{WeekMode, Weekday, weekday_of_date};
use crate::error::{AttendanceError, AttendanceResult};
use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const NO_CLASS: &str = "-";

// Collide with the persisted record keys.
const RESERVED_NAMES: [&str; 2] = ["proxies", "extras"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Subject(String),
    Free,
}

impl Slot {
    pub fn subject(&self) -> Option<&str> {
        match self {
            Slot::Subject(name) => Some(name),
            Slot::Free => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Subject(name) => f.write_str(name),
            Slot::Free => f.write_str(NO_CLASS),
        }
    }
}

impl From<&str> for Slot {
    fn from(value: &str) -> Self {
        if value == NO_CLASS {
            Slot::Free
        } else {
            Slot::Subject(value.to_string())
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Subject(name) => serializer.serialize_str(name),
            Slot::Free => serializer.serialize_str(NO_CLASS),
        }
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(de::Error::custom("timetable slot must not be empty"));
        }
        Ok(Slot::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    days: BTreeMap<Weekday, Vec<Slot>>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_days<I, S>(days: I) -> Self
    where
        I: IntoIterator<Item = (Weekday, Vec<S>)>,
        S: AsRef<str>,
    {
        let days = days
            .into_iter()
            .map(|(day, slots)| {
                (
                    day,
                    slots
                        .iter()
                        .map(|slot| Slot::from(slot.as_ref()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        Self { days }
    }

    pub fn subjects_for(&self, day: Weekday) -> &[Slot] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn scheduled_on(&self, date: NaiveDate, mode: WeekMode) -> &[Slot] {
        weekday_of_date(date, mode)
            .map(|day| self.subjects_for(day))
            .unwrap_or_default()
    }

    pub fn all_subjects(&self) -> BTreeSet<String> {
        self.days
            .values()
            .flatten()
            .filter_map(Slot::subject)
            .map(ToOwned::to_owned)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.days
            .values()
            .flatten()
            .any(|slot| slot.subject() == Some(name))
    }

    pub fn add_subject(&mut self, name: &str, days: &BTreeSet<Weekday>) -> AttendanceResult<()> {
        validate_subject_name(name)?;

        if self.contains(name) {
            return Err(AttendanceError::DuplicateSubject(name.to_string()));
        }
        if days.is_empty() {
            return Err(AttendanceError::InvalidSchedule(format!(
                "{name} must be scheduled on at least one day"
            )));
        }

        days.iter().for_each(|day| {
            self.days
                .entry(*day)
                .or_default()
                .push(Slot::Subject(name.to_string()));
        });

        Ok(())
    }

    pub fn remove_subject(&mut self, name: &str) -> bool {
        let mut removed = false;
        self.days.values_mut().for_each(|slots| {
            let before = slots.len();
            slots.retain(|slot| slot.subject() != Some(name));
            removed |= slots.len() != before;
        });

        removed
    }
}

pub fn validate_subject_name(name: &str) -> AttendanceResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == NO_CLASS
        || RESERVED_NAMES.contains(&name)
    {
        return Err(AttendanceError::InvalidSubjectName(name.to_string()));
    }

    Ok(())
}

pub fn default_timetable() -> Timetable {
    Timetable::from_days([
        (
            Weekday::Monday,
            vec!["UIUE Lab", "JFSD", "DWM", "SDS", "UXDD"],
        ),
        (
            Weekday::Tuesday,
            vec!["DAL Lab", "JFSD", "ELECTIVE", "SDS", "WATL"],
        ),
        (
            Weekday::Wednesday,
            vec!["PPL Lab", "UXDD", "ELECTIVE", "SDS", "DWM"],
        ),
        (
            Weekday::Thursday,
            vec!["UXDD", "DWM", "WATL Lab", "JFSD", "ELECTIVE"],
        ),
        (Weekday::Friday, vec!["JFSD Lab", "SDS", "ELECTIVE", "-", "-"]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn days(list: &[Weekday]) -> BTreeSet<Weekday> {
        list.iter().copied().collect()
    }

    #[test]
    fn all_subjects_skips_placeholder_and_duplicates() {
        let timetable = default_timetable();
        let subjects = timetable.all_subjects();

        assert!(!subjects.contains(NO_CLASS));
        assert_eq!(subjects.len(), 11);
        assert!(subjects.contains("DWM"));
        assert!(subjects.contains("JFSD Lab"));
    }

    #[test]
    fn friday_keeps_placeholder_slots() {
        let timetable = default_timetable();
        let friday = timetable.subjects_for(Weekday::Friday);

        assert_eq!(friday.len(), 5);
        assert_eq!(friday[3], Slot::Free);
        assert!(timetable.subjects_for(Weekday::Saturday).is_empty());
    }

    #[test]
    fn add_subject_validates_input() {
        let mut timetable = Timetable::new();
        timetable
            .add_subject("DWM", &days(&[Weekday::Monday, Weekday::Thursday]))
            .unwrap();

        assert_eq!(
            timetable.add_subject("DWM", &days(&[Weekday::Friday])),
            Err(AttendanceError::DuplicateSubject("DWM".to_string()))
        );
        assert!(matches!(
            timetable.add_subject("SDS", &BTreeSet::new()),
            Err(AttendanceError::InvalidSchedule(_))
        ));
        for name in ["", "  ", "-", "proxies", " DWM"] {
            assert_eq!(
                timetable.add_subject(name, &days(&[Weekday::Monday])),
                Err(AttendanceError::InvalidSubjectName(name.to_string()))
            );
        }

        let dwm = Slot::from("DWM");
        assert!(timetable.subjects_for(Weekday::Monday).contains(&dwm));
        assert!(timetable.subjects_for(Weekday::Thursday).contains(&dwm));
        assert!(!timetable.subjects_for(Weekday::Tuesday).contains(&dwm));
    }

    #[test]
    fn subject_names_are_case_sensitive() {
        let mut timetable = Timetable::new();
        timetable.add_subject("dwm", &days(&[Weekday::Monday])).unwrap();
        timetable.add_subject("DWM", &days(&[Weekday::Monday])).unwrap();

        assert_eq!(timetable.all_subjects().len(), 2);
    }

    #[test]
    fn remove_subject_clears_every_day() {
        let mut timetable = default_timetable();

        assert!(timetable.remove_subject("DWM"));
        assert!(!timetable.all_subjects().contains("DWM"));
        assert_eq!(timetable.subjects_for(Weekday::Monday).len(), 4);
        assert!(!timetable.remove_subject("DWM"));
    }

    #[test]
    fn serializes_as_weekday_keyed_object() {
        let timetable = Timetable::from_days([(Weekday::Friday, vec!["SDS", "-"])]);
        let value = serde_json::to_value(&timetable).unwrap();

        assert_eq!(value, json!({ "Friday": ["SDS", "-"] }));

        let parsed: Timetable = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, timetable);
    }
}
