use attendance_tracker::analyzer::{SubjectStats, compute_stats};
use attendance_tracker::calendar::{Weekday, parse_date};
use attendance_tracker::error::{AttendanceError, EntryKind};
use attendance_tracker::ledger::{AttendanceLedger, Status};
use attendance_tracker::store::Snapshot;
use attendance_tracker::timetable::{Timetable, default_timetable};
use chrono::NaiveDate;

fn date(raw: &str) -> NaiveDate {
    parse_date(raw).unwrap()
}

fn monday_dwm() -> Timetable {
    Timetable::from_days([(Weekday::Monday, vec!["DWM"])])
}

#[test]
fn cancelled_lecture_is_excluded_from_total() {
    let timetable = monday_dwm();
    let mut ledger = AttendanceLedger::new();
    ledger.mark_regular(date("2025-09-15"), "DWM", Status::Present);
    ledger.mark_regular(date("2025-09-22"), "DWM", Status::Absent);

    let before = compute_stats(&ledger, &timetable.all_subjects())["DWM"];
    ledger.mark_regular(date("2025-09-29"), "DWM", Status::Cancelled);
    let after = compute_stats(&ledger, &timetable.all_subjects())["DWM"];

    assert_eq!(before.total, after.total);
    assert_eq!(
        after,
        SubjectStats {
            present: 1,
            total: 2,
            percent: 50,
        }
    );
}

#[test]
fn proxy_counts_toward_replacement_subject() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    let tuesday = date("2025-09-16");

    let before = compute_stats(&ledger, &timetable.all_subjects())["DWM"];
    assert!(ledger.add_proxy(tuesday, "JFSD", "DWM"));
    ledger.set_proxy_status(tuesday, 0, Status::Present).unwrap();
    let after = compute_stats(&ledger, &timetable.all_subjects());

    assert_eq!(after["DWM"].present, before.present + 1);
    assert_eq!(after["DWM"].total, before.total + 1);
    assert_eq!(after["JFSD"].total, 0);
}

#[test]
fn proxy_index_past_end_is_rejected() {
    let mut ledger = AttendanceLedger::new();
    let tuesday = date("2025-09-16");
    ledger.add_proxy(tuesday, "JFSD", "DWM");

    assert_eq!(
        ledger.set_proxy_status(tuesday, 5, Status::Absent),
        Err(AttendanceError::IndexOutOfRange {
            date: tuesday,
            kind: EntryKind::Proxy,
            index: 5,
            len: 1,
        })
    );
}

#[test]
fn present_never_exceeds_total() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    let statuses = [Status::Present, Status::Absent, Status::Cancelled];

    for (offset, subject) in timetable.all_subjects().iter().enumerate() {
        for week in 0..6 {
            let day = date("2025-09-01") + chrono::Duration::days((week * 7 + offset) as i64);
            ledger.mark_regular(day, subject, statuses[(week + offset) % statuses.len()]);
        }
        ledger.add_extra(date("2025-10-20"), subject, None);
    }

    for stats in compute_stats(&ledger, &timetable.all_subjects()).values() {
        assert!(stats.present <= stats.total);
        assert!(stats.percent <= 100);
    }
}

#[test]
fn snapshot_round_trip_preserves_stats() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    ledger.mark_regular(date("2025-09-15"), "DWM", Status::Present);
    ledger.mark_regular(date("2025-09-15"), "SDS", Status::Absent);
    ledger.add_proxy(date("2025-09-16"), "JFSD", "DWM");
    ledger.add_extra(date("2025-09-19"), "SDS", Some("Dr. Rao"));
    ledger.set_extra_status(date("2025-09-19"), 0, Status::Absent).unwrap();

    let snapshot = Snapshot::new(timetable.clone(), ledger.clone());
    let raw = serde_json::to_string(&snapshot).unwrap();
    let restored: Snapshot = serde_json::from_str(&raw).unwrap();
    let restored_timetable = restored.timetable.unwrap();

    assert_eq!(
        compute_stats(&restored.attendance, &restored_timetable.all_subjects()),
        compute_stats(&ledger, &timetable.all_subjects())
    );
}

#[test]
fn removing_subject_cascades_through_ledger() {
    let mut timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    ledger.mark_regular(date("2025-09-15"), "DWM", Status::Present);
    ledger.mark_regular(date("2025-09-15"), "SDS", Status::Present);
    ledger.mark_regular(date("2025-09-17"), "DWM", Status::Absent);

    assert!(timetable.remove_subject("DWM"));
    ledger.cascade_delete_subject("DWM");

    assert!(!timetable.all_subjects().contains("DWM"));
    assert!(
        ledger
            .records()
            .all(|(_, record)| record.status_of("DWM").is_none())
    );
    assert!(!compute_stats(&ledger, &timetable.all_subjects()).contains_key("DWM"));
}

#[test]
fn extra_counts_toward_its_own_subject() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    let friday = date("2025-09-19");

    assert!(ledger.add_extra(friday, "SDS", Some("Dr. Rao")));
    assert!(ledger.add_extra(friday, "Guest", None));
    assert!(ledger.add_proxy(friday, "JFSD", "DWM"));
    ledger.set_proxy_status(friday, 0, Status::Cancelled).unwrap();

    let stats = compute_stats(&ledger, &timetable.all_subjects());

    assert_eq!(
        stats["SDS"],
        SubjectStats {
            present: 1,
            total: 1,
            percent: 100,
        }
    );
    assert_eq!(stats["DWM"], SubjectStats::default());
    assert!(!stats.contains_key("Guest"));
}

#[test]
fn cancelled_extra_counts_nowhere() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    let friday = date("2025-09-19");

    ledger.mark_regular(friday, "SDS", Status::Present);
    ledger.add_extra(friday, "SDS", None);
    ledger.set_extra_status(friday, 0, Status::Cancelled).unwrap();

    assert_eq!(
        compute_stats(&ledger, &timetable.all_subjects())["SDS"],
        SubjectStats {
            present: 1,
            total: 1,
            percent: 100,
        }
    );
}

#[test]
fn extra_status_change_moves_counts() {
    let timetable = default_timetable();
    let mut ledger = AttendanceLedger::new();
    let friday = date("2025-09-19");

    ledger.mark_regular(friday, "SDS", Status::Present);
    ledger.add_extra(friday, "SDS", None);
    let before = compute_stats(&ledger, &timetable.all_subjects())["SDS"];
    assert_eq!(
        before,
        SubjectStats {
            present: 2,
            total: 2,
            percent: 100,
        }
    );

    ledger.set_extra_status(friday, 0, Status::Absent).unwrap();

    assert_eq!(
        compute_stats(&ledger, &timetable.all_subjects())["SDS"],
        SubjectStats {
            present: 1,
            total: 2,
            percent: 50,
        }
    );
}
