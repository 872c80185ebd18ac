use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use std::fs;
use task_scheduler::{
    Calendar, Deadline, Event, PersistenceError, Task, WhichDays, load_calendar_from_csv,
    load_calendar_from_json, priority, save_calendar_to_csv, save_calendar_to_json,
};
use tempfile::tempdir;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn sample_calendar() -> Calendar {
    let mut cal = Calendar::new();
    cal.add_task(
        "Report",
        Duration::minutes(90),
        dt(2025, 3, 14, 17, 0),
        priority::HIGH,
    )
    .unwrap();
    cal.add_task("Read", Duration::minutes(25), Deadline::Anytime, priority::NO_PRIORITY)
        .unwrap();
    cal.add_event(
        Event::new(
            Task::new("Standup").with_duration(Duration::minutes(15)),
            dt(2025, 3, 10, 9, 0),
            None,
            WhichDays::from_days([Weekday::Mon, Weekday::Wed]),
        )
        .unwrap(),
    );
    cal.add_event(
        Event::new(
            Task::new("Dentist, downtown"),
            dt(2025, 3, 11, 14, 0),
            Some(dt(2025, 3, 11, 15, 0)),
            WhichDays::none(),
        )
        .unwrap()
        .with_event_id(7),
    );
    cal
}

#[test]
fn json_snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.json");
    let cal = sample_calendar();

    save_calendar_to_json(&cal, &path).unwrap();
    let loaded = load_calendar_from_json(&path).unwrap();

    assert_eq!(loaded, cal);
    assert_eq!(loaded.definite_events()[0].event_id(), Some(7));
    assert_eq!(loaded.tasks()[1].due_date, Deadline::Anytime);
}

#[test]
fn json_snapshot_stores_anytime_as_null() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.json");
    save_calendar_to_json(&sample_calendar(), &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(value["tasks"][1]["due_date"].is_null());
    assert_eq!(value["tasks"][0]["duration_minutes"], 90.0);
    assert_eq!(value["recurring_events"][0]["which_days"]["wednesday"], true);
}

#[test]
fn json_snapshot_with_bad_event_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{
            "definite_events": [{
                "task": {"name": "Backwards", "duration_minutes": 30.0},
                "start_time": "2025-03-10T10:00:00",
                "end_time": "2025-03-10T09:00:00"
            }]
        }"#,
    )
    .unwrap();

    let err = load_calendar_from_json(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));
}

#[test]
fn json_snapshot_with_huge_duration_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("huge.json");
    fs::write(
        &path,
        r#"{"tasks": [{"name": "x", "duration_minutes": -1e300}]}"#,
    )
    .unwrap();

    let err = load_calendar_from_json(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::Serialization(_)));
}

#[test]
fn csv_with_huge_duration_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("huge.csv");
    fs::write(
        &path,
        "kind,task_id,name,duration_minutes,due_date,priority,event_id,start_time,end_time,which_days\n\
         task,,x,1e300,,200,,,,\n",
    )
    .unwrap();

    let err = load_calendar_from_csv(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calendar.csv");
    let cal = sample_calendar();

    save_calendar_to_csv(&cal, &path).unwrap();
    let loaded = load_calendar_from_csv(&path).unwrap();

    assert_eq!(loaded, cal);
    assert_eq!(loaded.definite_events()[0].name(), "Dentist, downtown");
    assert!(loaded.recurring_events()[0].occurs_on(Weekday::Wed));
}

#[test]
fn csv_with_unknown_kind_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "kind,task_id,name,duration_minutes,due_date,priority,event_id,start_time,end_time,which_days\n\
         chore,,Dishes,10,,200,,,,\n",
    )
    .unwrap();

    let err = load_calendar_from_csv(&path).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_event_without_start_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "kind,task_id,name,duration_minutes,due_date,priority,event_id,start_time,end_time,which_days\n\
         event,,Gym,60,,200,,,,Mon\n",
    )
    .unwrap();

    assert!(load_calendar_from_csv(&path).is_err());
}
