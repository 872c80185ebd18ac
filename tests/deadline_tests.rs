use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use task_scheduler::Deadline;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn anytime_is_later_than_any_timestamp() {
    let samples = [
        dt(1970, 1, 1, 0, 0),
        dt(2025, 3, 10, 9, 0),
        dt(9999, 12, 31, 23, 59),
    ];
    for ts in samples {
        assert!(Deadline::Anytime.is_after(ts));
        assert!(!Deadline::Anytime.is_before(ts));
        assert_ne!(Deadline::Anytime, Deadline::At(ts));
        assert_eq!(
            Deadline::Anytime.compare(&Deadline::At(ts)),
            Ordering::Greater
        );
        assert_eq!(Deadline::At(ts).compare(&Deadline::Anytime), Ordering::Less);
    }
}

#[test]
fn anytime_equals_only_itself() {
    assert_eq!(Deadline::Anytime, Deadline::Anytime);
    assert_eq!(
        Deadline::Anytime.compare(&Deadline::Anytime),
        Ordering::Equal
    );
    assert!(Deadline::default().is_anytime());
}

#[test]
fn concrete_deadlines_compare_by_timestamp() {
    let early = Deadline::At(dt(2025, 3, 10, 9, 0));
    let late = Deadline::At(dt(2025, 3, 10, 17, 0));
    assert_eq!(early.compare(&late), Ordering::Less);
    assert_eq!(late.compare(&early), Ordering::Greater);
    assert!(early.is_before(dt(2025, 3, 10, 9, 1)));
    assert!(!early.is_before(dt(2025, 3, 10, 9, 0)));
}

#[test]
fn arithmetic_keeps_anytime_unbounded() {
    let hour = Duration::hours(1);
    assert_eq!(Deadline::Anytime + hour, Deadline::Anytime);
    assert_eq!(Deadline::Anytime - hour, Deadline::Anytime);

    let at = Deadline::At(dt(2025, 3, 10, 9, 0));
    assert_eq!(at + hour, Deadline::At(dt(2025, 3, 10, 10, 0)));
    assert_eq!(at - hour, Deadline::At(dt(2025, 3, 10, 8, 0)));
}

#[test]
fn sorting_with_compare_puts_anytime_last() {
    let mut deadlines = vec![
        Deadline::Anytime,
        Deadline::At(dt(2025, 3, 12, 9, 0)),
        Deadline::Anytime,
        Deadline::At(dt(2025, 3, 10, 9, 0)),
    ];
    deadlines.sort_by(Deadline::compare);
    assert_eq!(
        deadlines,
        vec![
            Deadline::At(dt(2025, 3, 10, 9, 0)),
            Deadline::At(dt(2025, 3, 12, 9, 0)),
            Deadline::Anytime,
            Deadline::Anytime,
        ]
    );
}
