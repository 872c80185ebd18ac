use crate::error::CalendarError;
use crate::event::{Event, EventId};
use crate::task::{Task, TaskId};
use crate::validation;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid record: {0}")]
    Validation(#[from] CalendarError),
    #[error("storage lock poisoned")]
    LockPoisoned,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage collaborator for tasks and events.
///
/// Identifiers are handed back to the caller; stores never mutate the values
/// they are given.
pub trait TaskStore {
    /// Insert the task, or overwrite the row when it already carries an id.
    fn add_task(&self, task: &Task) -> PersistenceResult<TaskId>;
    fn get_tasks(&self) -> PersistenceResult<Vec<Task>>;
    /// Insert the event, creating its task row first when the task has no id.
    fn add_event(&self, event: &Event) -> PersistenceResult<EventId>;
    fn get_events(&self) -> PersistenceResult<Vec<Event>>;
}

pub fn validate_tasks(tasks: &[Task]) -> PersistenceResult<()> {
    validation::validate_task_collection(tasks).map_err(PersistenceError::from)
}

pub fn validate_events(events: &[Event]) -> PersistenceResult<()> {
    validation::validate_event_collection(events).map_err(PersistenceError::from)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_calendar_from_csv, load_calendar_from_json, save_calendar_to_csv, save_calendar_to_json,
};
