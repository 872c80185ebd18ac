use crate::deadline::Deadline;
use crate::error::{CalendarError, CalendarResult};
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage-assigned identifier of a task row.
pub type TaskId = i64;

/// Priority levels. Lower numbers are more urgent.
pub mod priority {
    pub const HIGH: i32 = 0;
    pub const MEDIUM: i32 = HIGH + 5;
    pub const LOW: i32 = MEDIUM + 5;
    pub const NO_PRIORITY: i32 = LOW * 20;

    /// Parse a named level (`high`, `medium`, `low`, `none`) or a raw integer.
    pub fn parse(input: &str) -> Option<i32> {
        match input.trim().to_ascii_lowercase().as_str() {
            "high" => Some(HIGH),
            "medium" => Some(MEDIUM),
            "low" => Some(LOW),
            "none" => Some(NO_PRIORITY),
            other => other.parse().ok(),
        }
    }
}

pub fn default_duration() -> Duration {
    Duration::minutes(30)
}

pub fn minutes_from_duration(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

/// `None` when `minutes` is not finite or does not fit a `Duration`.
pub fn duration_from_minutes(minutes: f64) -> Option<Duration> {
    let millis = (minutes * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// A currently unassigned piece of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_id: Option<TaskId>,
    pub name: String,
    #[serde(rename = "duration_minutes", with = "duration_minutes")]
    pub duration: Duration,
    #[serde(default)]
    pub due_date: Deadline,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    priority::NO_PRIORITY
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            task_id: None,
            name: name.into(),
            duration: default_duration(),
            due_date: Deadline::Anytime,
            priority: priority::NO_PRIORITY,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<Deadline>) -> Self {
        self.due_date = due_date.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Bind the identifier returned by a store. Ids are not reassigned once set.
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.bind_task_id(task_id);
        self
    }

    pub(crate) fn bind_task_id(&mut self, task_id: TaskId) {
        if self.task_id.is_none() {
            self.task_id = Some(task_id);
        }
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// `start + duration`, failing when the result leaves the representable range.
    pub fn time_after(&self, start: NaiveDateTime) -> CalendarResult<NaiveDateTime> {
        start.checked_add_signed(self.duration).ok_or_else(|| {
            CalendarError::InvalidArgument(format!(
                "task {} ends out of range when started at {}",
                self.name, start
            ))
        })
    }

    pub fn time_after_now(&self) -> CalendarResult<NaiveDateTime> {
        self.time_after(Local::now().naive_local())
    }

    /// Latest start that still meets the due date.
    pub fn last_chance(&self) -> Deadline {
        self.due_date - self.duration
    }

    /// Time between `start` and the last chance, `None` when there is no deadline.
    pub fn slack(&self, start: NaiveDateTime) -> Option<Duration> {
        self.last_chance().timestamp().map(|latest| latest - start)
    }

    pub fn slack_now(&self) -> Option<Duration> {
        self.slack(Local::now().naive_local())
    }
}

pub(crate) mod duration_minutes {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::minutes_from_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let minutes = f64::deserialize(deserializer)?;
        super::duration_from_minutes(minutes).ok_or_else(|| {
            serde::de::Error::custom(format!("duration of {minutes} minutes is out of range"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_accepts_names_and_numbers() {
        assert_eq!(priority::parse("HIGH"), Some(priority::HIGH));
        assert_eq!(priority::parse("none"), Some(200));
        assert_eq!(priority::parse("7"), Some(7));
        assert_eq!(priority::parse("urgent"), None);
    }

    #[test]
    fn minutes_conversion_keeps_sub_minute_precision() {
        let d = Duration::seconds(90);
        assert_eq!(minutes_from_duration(d), 1.5);
        assert_eq!(duration_from_minutes(1.5), Some(d));
    }

    #[test]
    fn out_of_range_minutes_are_rejected() {
        assert_eq!(duration_from_minutes(f64::NAN), None);
        assert_eq!(duration_from_minutes(-1e300), None);
        assert_eq!(duration_from_minutes(1e300), None);
        assert!(serde_json::from_str::<Task>(r#"{"name":"x","duration_minutes":-1e300}"#).is_err());
    }

    #[test]
    fn time_after_reports_overflow() {
        let task = Task::new("Forever").with_duration(Duration::days(100_000_000));
        let start = chrono::NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(matches!(
            task.time_after(start),
            Err(CalendarError::InvalidArgument(_))
        ));
    }

    #[test]
    fn task_id_is_only_bound_once() {
        let task = Task::new("Write").with_task_id(3).with_task_id(9);
        assert_eq!(task.task_id(), Some(3));
    }
}
