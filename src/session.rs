use crate::analyzer::{SubjectStats, compute_stats};
use crate::calendar::{WeekMode, Weekday, weekday_of_date};
use crate::error::{AttendanceError, AttendanceResult};
use crate::identity::UserHandle;
use crate::ledger::{AttendanceLedger, ExtraEntry, ProxyEntry, Status};
use crate::store::{RemoteStore, Snapshot};
use crate::timetable::{Slot, Timetable};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub week_mode: WeekMode,
    pub extra_lectures: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            week_mode: WeekMode::Five,
            extra_lectures: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub period: usize,
    pub subject: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkView {
    pub subject: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub weekday: Option<Weekday>,
    pub slots: Vec<SlotView>,
    pub other_marks: Vec<MarkView>,
    pub proxies: Vec<ProxyEntry>,
    pub extras: Vec<ExtraEntry>,
}

pub struct Session<S: RemoteStore> {
    user: UserHandle,
    store: S,
    settings: SessionSettings,
    timetable: Timetable,
    ledger: AttendanceLedger,
    dirty: bool,
}

impl<S: RemoteStore> Session<S> {
    pub fn open(
        user: UserHandle,
        store: S,
        settings: SessionSettings,
        default_timetable: Timetable,
    ) -> Result<Self> {
        let snapshot = store.read(&user)?;

        let (timetable, ledger) = match snapshot {
            Some(snapshot) => {
                info!(
                    user = %user.uid,
                    dates = snapshot.attendance.len(),
                    "loaded stored snapshot"
                );
                (
                    snapshot.timetable.unwrap_or(default_timetable),
                    snapshot.attendance,
                )
            }
            None => {
                info!(user = %user.uid, "no stored snapshot, starting fresh");
                (default_timetable, AttendanceLedger::new())
            }
        };

        Ok(Self {
            user,
            store,
            settings,
            timetable,
            ledger,
            dirty: false,
        })
    }

    pub fn user(&self) -> &UserHandle {
        &self.user
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn ledger(&self) -> &AttendanceLedger {
        &self.ledger
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.timetable.clone(), self.ledger.clone())
    }

    pub fn stats(&self) -> BTreeMap<String, SubjectStats> {
        compute_stats(&self.ledger, &self.timetable.all_subjects())
    }

    pub fn day_view(&self, date: NaiveDate) -> DayView {
        let record = self.ledger.record(date);
        let scheduled = self.timetable.scheduled_on(date, self.settings.week_mode);
        let slots = scheduled
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotView {
                period: index + 1,
                subject: slot.subject().map(ToOwned::to_owned),
                status: match slot {
                    Slot::Subject(name) => record.and_then(|record| record.status_of(name)),
                    Slot::Free => None,
                },
            })
            .collect();

        let other_marks = record
            .map(|record| {
                record
                    .marks
                    .iter()
                    .filter(|(subject, _)| {
                        !scheduled
                            .iter()
                            .any(|slot| slot.subject() == Some(subject.as_str()))
                    })
                    .map(|(subject, status)| MarkView {
                        subject: subject.clone(),
                        status: *status,
                    })
                    .collect()
            })
            .unwrap_or_default();

        DayView {
            date,
            weekday: weekday_of_date(date, self.settings.week_mode),
            slots,
            other_marks,
            proxies: record.map(|record| record.proxies.clone()).unwrap_or_default(),
            extras: record.map(|record| record.extras.clone()).unwrap_or_default(),
        }
    }

    pub fn mark(&mut self, date: NaiveDate, subject: &str, status: Status) -> AttendanceResult<()> {
        if !self.timetable.contains(subject) {
            return Err(AttendanceError::UnknownSubject(subject.to_string()));
        }

        self.ledger.mark_regular(date, subject, status);
        self.flush();
        Ok(())
    }

    pub fn add_proxy(
        &mut self,
        date: NaiveDate,
        scheduled: &str,
        replacement: &str,
    ) -> AttendanceResult<bool> {
        self.ensure_extra_lectures("proxy")?;

        let added = self.ledger.add_proxy(date, scheduled, replacement);
        if added {
            self.flush();
        }
        Ok(added)
    }

    pub fn set_proxy_status(
        &mut self,
        date: NaiveDate,
        index: usize,
        status: Status,
    ) -> AttendanceResult<()> {
        self.ensure_extra_lectures("proxy")?;

        self.ledger.set_proxy_status(date, index, status)?;
        self.flush();
        Ok(())
    }

    pub fn add_extra(
        &mut self,
        date: NaiveDate,
        subject: &str,
        teacher: Option<&str>,
    ) -> AttendanceResult<bool> {
        self.ensure_extra_lectures("extra")?;

        let added = self.ledger.add_extra(date, subject, teacher);
        if added {
            self.flush();
        }
        Ok(added)
    }

    pub fn set_extra_status(
        &mut self,
        date: NaiveDate,
        index: usize,
        status: Status,
    ) -> AttendanceResult<()> {
        self.ensure_extra_lectures("extra")?;

        self.ledger.set_extra_status(date, index, status)?;
        self.flush();
        Ok(())
    }

    pub fn add_subject(&mut self, name: &str, days: &BTreeSet<Weekday>) -> AttendanceResult<()> {
        if let Some(day) = days
            .iter()
            .find(|day| !self.settings.week_mode.is_schedulable(**day))
        {
            return Err(AttendanceError::InvalidSchedule(format!(
                "{day} is not a teaching day in {} day mode",
                self.settings.week_mode
            )));
        }

        self.timetable.add_subject(name, days)?;
        self.flush();
        Ok(())
    }

    pub fn remove_subject(&mut self, name: &str) -> AttendanceResult<usize> {
        if !self.timetable.remove_subject(name) {
            return Err(AttendanceError::UnknownSubject(name.to_string()));
        }

        let removed = self.ledger.cascade_delete_subject(name);
        info!(subject = name, marks = removed, "subject removed");
        self.flush();
        Ok(removed)
    }

    pub fn flush(&mut self) -> bool {
        match self.store.write(&self.user, &self.snapshot()) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(error) => {
                error!(
                    error = %error,
                    user = %self.user.uid,
                    "failed to persist attendance snapshot"
                );
                self.dirty = true;
                false
            }
        }
    }

    fn ensure_extra_lectures(&self, feature: &'static str) -> AttendanceResult<()> {
        if self.settings.extra_lectures {
            Ok(())
        } else {
            Err(AttendanceError::FeatureDisabled(feature))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::default_timetable;
    use anyhow::bail;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        document: Mutex<Option<Snapshot>>,
        fail_writes: bool,
    }

    impl RemoteStore for MemoryStore {
        fn read(&self, _user: &UserHandle) -> Result<Option<Snapshot>> {
            Ok(self.document.lock().unwrap().clone())
        }

        fn write(&self, _user: &UserHandle, snapshot: &Snapshot) -> Result<()> {
            if self.fail_writes {
                bail!("store offline");
            }
            *self.document.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn open(store: MemoryStore, settings: SessionSettings) -> Session<MemoryStore> {
        Session::open(
            UserHandle::new("student-1"),
            store,
            settings,
            default_timetable(),
        )
        .unwrap()
    }

    #[test]
    fn fresh_account_uses_default_timetable() {
        let session = open(MemoryStore::default(), SessionSettings::default());

        assert_eq!(session.timetable(), &default_timetable());
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn mutations_are_flushed() {
        let mut session = open(MemoryStore::default(), SessionSettings::default());
        session
            .mark(date("2025-09-15"), "DWM", Status::Present)
            .unwrap();

        let stored = session.store.document.lock().unwrap().clone().unwrap();
        assert_eq!(stored.attendance, *session.ledger());
        assert!(!session.is_dirty());
    }

    #[test]
    fn failed_flush_keeps_memory_state() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let mut session = open(store, SessionSettings::default());

        session
            .mark(date("2025-09-15"), "DWM", Status::Absent)
            .unwrap();

        assert!(session.is_dirty());
        assert_eq!(
            session
                .ledger()
                .record(date("2025-09-15"))
                .and_then(|record| record.status_of("DWM")),
            Some(Status::Absent)
        );
    }

    #[test]
    fn unknown_subject_cannot_be_marked() {
        let mut session = open(MemoryStore::default(), SessionSettings::default());

        assert_eq!(
            session.mark(date("2025-09-15"), "Chemistry", Status::Present),
            Err(AttendanceError::UnknownSubject("Chemistry".to_string()))
        );
    }

    #[test]
    fn marking_outside_schedule_is_allowed() {
        let mut session = open(MemoryStore::default(), SessionSettings::default());

        // DWM is not on Tuesdays.
        session
            .mark(date("2025-09-16"), "DWM", Status::Present)
            .unwrap();
        session
            .mark(date("2025-09-16"), "JFSD", Status::Absent)
            .unwrap();
        assert_eq!(session.stats()["DWM"].present, 1);

        let view = session.day_view(date("2025-09-16"));
        assert_eq!(
            view.other_marks,
            vec![MarkView {
                subject: "DWM".to_string(),
                status: Status::Present,
            }]
        );
        assert_eq!(view.slots[1].status, Some(Status::Absent));
    }

    #[test]
    fn disabled_capability_rejects_proxies_and_extras() {
        let settings = SessionSettings {
            extra_lectures: false,
            ..SessionSettings::default()
        };
        let mut session = open(MemoryStore::default(), settings);

        assert_eq!(
            session.add_proxy(date("2025-09-16"), "JFSD", "DWM"),
            Err(AttendanceError::FeatureDisabled("proxy"))
        );
        assert_eq!(
            session.add_extra(date("2025-09-16"), "SDS", None),
            Err(AttendanceError::FeatureDisabled("extra"))
        );
    }

    #[test]
    fn five_day_mode_rejects_weekend_subjects() {
        let mut session = open(MemoryStore::default(), SessionSettings::default());
        let days = BTreeSet::from([Weekday::Saturday]);

        assert!(matches!(
            session.add_subject("Yoga", &days),
            Err(AttendanceError::InvalidSchedule(_))
        ));

        let settings = SessionSettings {
            week_mode: WeekMode::Seven,
            ..SessionSettings::default()
        };
        let mut session = open(MemoryStore::default(), settings);
        session.add_subject("Yoga", &days).unwrap();
        assert_eq!(session.day_view(date("2025-09-20")).slots.len(), 1);
    }

    #[test]
    fn day_view_shows_slots_and_entries() {
        let mut session = open(MemoryStore::default(), SessionSettings::default());
        session
            .mark(date("2025-09-19"), "SDS", Status::Cancelled)
            .unwrap();
        session
            .add_extra(date("2025-09-19"), "Guest talk", Some("Dr. Rao"))
            .unwrap();

        let view = session.day_view(date("2025-09-19"));
        assert_eq!(view.weekday, Some(Weekday::Friday));
        assert_eq!(view.slots.len(), 5);
        assert_eq!(view.slots[1].subject.as_deref(), Some("SDS"));
        assert_eq!(view.slots[1].status, Some(Status::Cancelled));
        assert_eq!(view.slots[4].subject, None);
        assert_eq!(view.extras.len(), 1);

        let weekend = session.day_view(date("2025-09-20"));
        assert_eq!(weekend.weekday, None);
        assert!(weekend.slots.is_empty());
    }

    #[test]
    fn reopening_restores_state() {
        let store = MemoryStore::default();
        let mut session = open(store, SessionSettings::default());
        session.remove_subject("ELECTIVE").unwrap();
        session
            .mark(date("2025-09-15"), "DWM", Status::Present)
            .unwrap();

        let Session { store, .. } = session;
        let reopened = open(store, SessionSettings::default());

        assert!(!reopened.timetable().all_subjects().contains("ELECTIVE"));
        assert_eq!(reopened.stats()["DWM"].present, 1);
    }
}
