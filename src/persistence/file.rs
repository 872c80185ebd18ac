use super::{PersistenceError, PersistenceResult};
use crate::calendar::Calendar;
use crate::deadline::Deadline;
use crate::event::{Event, WhichDays};
use crate::task::{Task, TaskId, duration_from_minutes, minutes_from_duration};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Serialize, Deserialize)]
struct CalendarSnapshot {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    definite_events: Vec<Event>,
    #[serde(default)]
    recurring_events: Vec<Event>,
}

impl CalendarSnapshot {
    fn from_calendar(calendar: &Calendar) -> Self {
        Self {
            tasks: calendar.tasks().to_vec(),
            definite_events: calendar.definite_events().to_vec(),
            recurring_events: calendar.recurring_events().to_vec(),
        }
    }

    fn into_calendar(self) -> PersistenceResult<Calendar> {
        let mut events = self.definite_events;
        events.extend(self.recurring_events);
        Ok(Calendar::from_parts(self.tasks, events)?)
    }
}

pub fn save_calendar_to_json<P: AsRef<Path>>(calendar: &Calendar, path: P) -> PersistenceResult<()> {
    let snapshot = CalendarSnapshot::from_calendar(calendar);
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    log::info!("wrote calendar snapshot to {}", path.as_ref().display());
    Ok(())
}

pub fn load_calendar_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Calendar> {
    let file = File::open(path)?;
    let snapshot: CalendarSnapshot = serde_json::from_reader(file)?;
    snapshot.into_calendar()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CalendarCsvRecord {
    kind: String,
    task_id: String,
    name: String,
    duration_minutes: f64,
    due_date: String,
    priority: i32,
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    which_days: String,
}

impl From<&Task> for CalendarCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            kind: "task".into(),
            task_id: format_option_i64(task.task_id()),
            name: task.name.clone(),
            duration_minutes: minutes_from_duration(task.duration),
            due_date: format_timestamp(task.due_date.timestamp()),
            priority: task.priority,
            ..Self::default()
        }
    }
}

impl From<&Event> for CalendarCsvRecord {
    fn from(event: &Event) -> Self {
        Self {
            kind: "event".into(),
            event_id: format_option_i64(event.event_id()),
            start_time: format_timestamp(Some(event.start_time)),
            end_time: format_timestamp(Some(event.end_time)),
            which_days: event.which_days.to_string(),
            ..Self::from(&event.task)
        }
    }
}

impl CalendarCsvRecord {
    fn to_task(&self) -> PersistenceResult<Task> {
        let duration = duration_from_minutes(self.duration_minutes).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid duration for '{}'", self.name))
        })?;
        let mut task = Task::new(self.name.clone())
            .with_duration(duration)
            .with_due_date(Deadline::from(parse_timestamp(&self.due_date)?))
            .with_priority(self.priority);
        if let Some(id) = parse_i64(&self.task_id)? {
            task = task.with_task_id(id);
        }
        Ok(task)
    }

    fn to_event(&self) -> PersistenceResult<Event> {
        let start_time = parse_timestamp(&self.start_time)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("event '{}' has no start_time", self.name))
        })?;
        let end_time = parse_timestamp(&self.end_time)?;
        let which_days = WhichDays::parse_list(&self.which_days).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid which_days '{}'", self.which_days))
        })?;
        let mut event = Event::new(self.to_task()?, start_time, end_time, which_days)?;
        if let Some(id) = parse_i64(&self.event_id)? {
            event = event.with_event_id(id);
        }
        Ok(event)
    }
}

pub fn save_calendar_to_csv<P: AsRef<Path>>(calendar: &Calendar, path: P) -> PersistenceResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for task in calendar.tasks() {
        writer.serialize(CalendarCsvRecord::from(task))?;
    }
    for event in calendar.events() {
        writer.serialize(CalendarCsvRecord::from(event))?;
    }
    writer.flush()?;
    log::info!("wrote calendar csv to {}", path.as_ref().display());
    Ok(())
}

pub fn load_calendar_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Calendar> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    let mut events = Vec::new();
    for record in reader.deserialize::<CalendarCsvRecord>() {
        let record = record?;
        match record.kind.trim() {
            "task" => tasks.push(record.to_task()?),
            "event" => events.push(record.to_event()?),
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "unknown row kind '{other}'"
                )));
            }
        }
    }
    Ok(Calendar::from_parts(tasks, events)?)
}

fn format_timestamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_timestamp(input: &str) -> PersistenceResult<Option<NaiveDateTime>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(input.trim(), TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}

fn format_option_i64(value: Option<TaskId>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}
