use super::{PersistenceError, PersistenceResult, TaskStore};
use crate::deadline::Deadline;
use crate::event::{Event, EventId, WhichDays};
use crate::task::{Task, TaskId, duration_from_minutes, minutes_from_duration};
use crate::validation;
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Format of the `tasks.due_date` column. `NULL` stands for no deadline.
pub const DUE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

pub fn format_due_date(due_date: Deadline) -> Option<String> {
    due_date
        .timestamp()
        .map(|ts| ts.format(DUE_DATE_FORMAT).to_string())
}

pub fn parse_due_date(value: Option<&str>) -> PersistenceResult<Deadline> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Deadline::Anytime),
        Some(text) => NaiveDateTime::parse_from_str(text, DUE_DATE_FORMAT)
            .map(Deadline::At)
            .map_err(|e| PersistenceError::InvalidData(format!("invalid due date '{text}': {e}"))),
    }
}

pub struct SqliteTaskStore {
    connection: Mutex<Connection>,
}

struct EventRow {
    event_id: EventId,
    task_id: TaskId,
    task_name: String,
    duration: f64,
    due_date: Option<String>,
    priority: i32,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    days: [bool; 7],
}

impl SqliteTaskStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path.as_ref())?;
        Self::initialize_schema(&connection)?;
        log::info!("opened task database at {}", path.as_ref().display());
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                task_name TEXT NOT NULL,
                duration REAL NOT NULL,
                due_date TEXT,
                priority INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                task_id INTEGER NOT NULL REFERENCES tasks(id),
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                monday INTEGER NOT NULL DEFAULT 0,
                tuesday INTEGER NOT NULL DEFAULT 0,
                wednesday INTEGER NOT NULL DEFAULT 0,
                thursday INTEGER NOT NULL DEFAULT 0,
                friday INTEGER NOT NULL DEFAULT 0,
                saturday INTEGER NOT NULL DEFAULT 0,
                sunday INTEGER NOT NULL DEFAULT 0
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn upsert_task(conn: &Connection, task: &Task) -> PersistenceResult<TaskId> {
        let minutes = minutes_from_duration(task.duration);
        let due_date = format_due_date(task.due_date);
        match task.task_id() {
            Some(id) => {
                conn.execute(
                    "INSERT INTO tasks (id, task_name, duration, due_date, priority)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        task_name = excluded.task_name,
                        duration = excluded.duration,
                        due_date = excluded.due_date,
                        priority = excluded.priority",
                    params![id, task.name, minutes, due_date, task.priority],
                )?;
                Ok(id)
            }
            None => {
                conn.execute(
                    "INSERT INTO tasks (task_name, duration, due_date, priority)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![task.name, minutes, due_date, task.priority],
                )?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    fn row_to_task(
        task_id: TaskId,
        name: String,
        duration: f64,
        due_date: Option<&str>,
        priority: i32,
    ) -> PersistenceResult<Task> {
        let duration = duration_from_minutes(duration).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "task {task_id} has out of range duration {duration}"
            ))
        })?;
        Ok(Task::new(name)
            .with_duration(duration)
            .with_due_date(parse_due_date(due_date)?)
            .with_priority(priority)
            .with_task_id(task_id))
    }
}

impl TaskStore for SqliteTaskStore {
    fn add_task(&self, task: &Task) -> PersistenceResult<TaskId> {
        validation::validate_task(task)?;
        let conn = self.lock()?;
        let id = Self::upsert_task(&conn, task)?;
        log::debug!("stored task '{}' as id {}", task.name, id);
        Ok(id)
    }

    fn get_tasks(&self) -> PersistenceResult<Vec<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, task_name, duration, due_date, priority FROM tasks ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, TaskId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, name, duration, due_date, priority) = row?;
            tasks.push(Self::row_to_task(
                id,
                name,
                duration,
                due_date.as_deref(),
                priority,
            )?);
        }
        super::validate_tasks(&tasks)?;
        Ok(tasks)
    }

    fn add_event(&self, event: &Event) -> PersistenceResult<EventId> {
        validation::validate_event(event)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let task_id = Self::upsert_task(&tx, &event.task)?;
        let [mon, tue, wed, thu, fri, sat, sun] = event.which_days.to_flags();
        let event_id = match event.event_id() {
            Some(id) => {
                tx.execute(
                    "INSERT INTO events (id, task_id, start_time, end_time,
                        monday, tuesday, wednesday, thursday, friday, saturday, sunday)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT(id) DO UPDATE SET
                        task_id = excluded.task_id,
                        start_time = excluded.start_time,
                        end_time = excluded.end_time,
                        monday = excluded.monday,
                        tuesday = excluded.tuesday,
                        wednesday = excluded.wednesday,
                        thursday = excluded.thursday,
                        friday = excluded.friday,
                        saturday = excluded.saturday,
                        sunday = excluded.sunday",
                    params![
                        id,
                        task_id,
                        event.start_time,
                        event.end_time,
                        mon,
                        tue,
                        wed,
                        thu,
                        fri,
                        sat,
                        sun
                    ],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO events (task_id, start_time, end_time,
                        monday, tuesday, wednesday, thursday, friday, saturday, sunday)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        task_id,
                        event.start_time,
                        event.end_time,
                        mon,
                        tue,
                        wed,
                        thu,
                        fri,
                        sat,
                        sun
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;
        log::debug!(
            "stored event '{}' as id {} (task {})",
            event.name(),
            event_id,
            task_id
        );
        Ok(event_id)
    }

    fn get_events(&self) -> PersistenceResult<Vec<Event>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.task_id, t.task_name, t.duration, t.due_date, t.priority,
                    e.start_time, e.end_time,
                    e.monday, e.tuesday, e.wednesday, e.thursday, e.friday, e.saturday, e.sunday
             FROM events e JOIN tasks t ON t.id = e.task_id
             ORDER BY e.id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EventRow {
                event_id: row.get(0)?,
                task_id: row.get(1)?,
                task_name: row.get(2)?,
                duration: row.get(3)?,
                due_date: row.get(4)?,
                priority: row.get(5)?,
                start_time: row.get(6)?,
                end_time: row.get(7)?,
                days: [
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                    row.get(13)?,
                    row.get(14)?,
                ],
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            let row = row?;
            let task = Self::row_to_task(
                row.task_id,
                row.task_name,
                row.duration,
                row.due_date.as_deref(),
                row.priority,
            )?;
            let event = Event::new(
                task,
                row.start_time,
                Some(row.end_time),
                WhichDays::from_flags(row.days),
            )?;
            events.push(event.with_event_id(row.event_id));
        }
        super::validate_events(&events)?;
        Ok(events)
    }
}
