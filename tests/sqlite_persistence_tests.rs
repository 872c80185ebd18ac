#![cfg(feature = "sqlite")]

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use task_scheduler::{
    Calendar, Deadline, Event, SqliteTaskStore, Task, TaskStore, WhichDays, priority,
};
use tempfile::NamedTempFile;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn sqlite_store_round_trips_tasks() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteTaskStore::new(file.path()).unwrap();

    let report = Task::new("Report")
        .with_duration(Duration::minutes(90))
        .with_due_date(dt(2025, 3, 10, 17, 0))
        .with_priority(priority::HIGH);
    let someday = Task::new("Someday").with_priority(priority::LOW);

    let report_id = store.add_task(&report).expect("insert report");
    let someday_id = store.add_task(&someday).expect("insert someday");
    assert_ne!(report_id, someday_id);

    // reopen to make sure rows hit the file
    drop(store);
    let store = SqliteTaskStore::new(file.path()).unwrap();
    let tasks = store.get_tasks().unwrap();
    assert_eq!(tasks.len(), 2);

    assert_eq!(tasks[0].task_id(), Some(report_id));
    assert_eq!(tasks[0].name, "Report");
    assert_eq!(tasks[0].duration, Duration::minutes(90));
    assert_eq!(tasks[0].due_date, Deadline::At(dt(2025, 3, 10, 17, 0)));
    assert_eq!(tasks[0].priority, priority::HIGH);

    assert_eq!(tasks[1].task_id(), Some(someday_id));
    assert_eq!(tasks[1].due_date, Deadline::Anytime);
    assert_eq!(tasks[1].duration, Duration::minutes(30));
}

#[test]
fn add_task_with_id_overwrites_row() {
    let store = SqliteTaskStore::in_memory().unwrap();
    let id = store.add_task(&Task::new("Draft")).unwrap();

    let renamed = Task::new("Final")
        .with_duration(Duration::minutes(45))
        .with_task_id(id);
    assert_eq!(store.add_task(&renamed).unwrap(), id);

    let tasks = store.get_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Final");
    assert_eq!(tasks[0].duration, Duration::minutes(45));
}

#[test]
fn add_task_rejects_negative_duration() {
    let store = SqliteTaskStore::in_memory().unwrap();
    let bad = Task::new("Bad").with_duration(Duration::minutes(-10));
    assert!(store.add_task(&bad).is_err());
    assert!(store.get_tasks().unwrap().is_empty());
}

#[test]
fn sqlite_store_round_trips_events() {
    let store = SqliteTaskStore::in_memory().unwrap();
    let standup = Event::new(
        Task::new("Standup").with_duration(Duration::minutes(15)),
        dt(2025, 3, 10, 9, 0),
        None,
        WhichDays::from_days([Weekday::Mon, Weekday::Fri]),
    )
    .unwrap();
    let dentist = Event::new(
        Task::new("Dentist").with_priority(priority::MEDIUM),
        dt(2025, 3, 11, 14, 0),
        Some(dt(2025, 3, 11, 15, 0)),
        WhichDays::none(),
    )
    .unwrap();

    let standup_id = store.add_event(&standup).unwrap();
    let dentist_id = store.add_event(&dentist).unwrap();

    let events = store.get_events().unwrap();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].event_id(), Some(standup_id));
    assert!(events[0].task_id().is_some());
    assert_eq!(events[0].name(), "Standup");
    assert_eq!(events[0].end_time, dt(2025, 3, 10, 9, 15));
    assert!(events[0].occurs_on(Weekday::Mon));
    assert!(events[0].occurs_on(Weekday::Fri));
    assert!(!events[0].occurs_on(Weekday::Tue));

    assert_eq!(events[1].event_id(), Some(dentist_id));
    assert!(!events[1].is_recurring());
    assert_eq!(events[1].priority(), priority::MEDIUM);
    assert_eq!(events[1].start_time, dt(2025, 3, 11, 14, 0));

    // each event owns a task row
    assert_eq!(store.get_tasks().unwrap().len(), 2);
}

#[test]
fn calendar_save_and_load_keeps_tasks_and_events_apart() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteTaskStore::new(file.path()).unwrap();

    let mut cal = Calendar::new();
    cal.add_task(
        "Taxes",
        Duration::minutes(120),
        dt(2025, 4, 15, 23, 0),
        priority::HIGH,
    )
    .unwrap();
    cal.add_event(
        Event::new(
            Task::new("Gym"),
            dt(2025, 3, 10, 18, 0),
            Some(dt(2025, 3, 10, 19, 0)),
            WhichDays::from_days([Weekday::Mon]),
        )
        .unwrap(),
    );
    cal.add_event(
        Event::new(
            Task::new("Dentist"),
            dt(2025, 3, 11, 14, 0),
            Some(dt(2025, 3, 11, 15, 0)),
            WhichDays::none(),
        )
        .unwrap(),
    );

    cal.save_to(&store).unwrap();
    assert!(cal.tasks()[0].task_id().is_some());
    assert!(cal.events().all(|e| e.event_id().is_some()));

    let loaded = Calendar::load_from(&store).unwrap();
    assert_eq!(loaded, cal);
    assert_eq!(loaded.tasks().len(), 1);
    assert_eq!(loaded.tasks()[0].name, "Taxes");
    assert_eq!(loaded.recurring_events().len(), 1);
    assert_eq!(loaded.definite_events().len(), 1);

    // saving again updates in place instead of duplicating rows
    cal.save_to(&store).unwrap();
    assert_eq!(store.get_tasks().unwrap().len(), 3);
    assert_eq!(store.get_events().unwrap().len(), 2);
}
