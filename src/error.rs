use chrono::{NaiveDateTime, Weekday};
use thiserror::Error;

/// Errors raised by the in-memory scheduling core.
///
/// Normal "conflict found / not found" outcomes are plain booleans; these
/// variants cover malformed input and operations the core cannot perform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("the event {name} doesn't have a recurring date during {weekday}")]
    NotRecurringOn { name: String, weekday: Weekday },

    #[error("event {name} ends at {end} before it starts at {start}")]
    InvalidTimeRange {
        name: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("task {name} has negative duration ({minutes} minutes)")]
    NegativeDuration { name: String, minutes: i64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("schedule is infeasible: {0}")]
    Infeasible(String),

    #[error("{0} hasn't been implemented yet")]
    NotImplemented(&'static str),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
