pub mod calendar;
pub mod config;
pub mod deadline;
pub mod error;
pub mod event;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod task;
pub(crate) mod validation;

pub use calendar::{Calendar, Conflict, default_break, default_headstart};
pub use config::{ConfigError, PlannerConfig};
pub use deadline::Deadline;
pub use error::{CalendarError, CalendarResult};
pub use event::{Event, EventId, WhichDays};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{
    PersistenceError, PersistenceResult, TaskStore, load_calendar_from_csv,
    load_calendar_from_json, save_calendar_to_csv, save_calendar_to_json,
};
pub use task::{Task, TaskId, priority};
