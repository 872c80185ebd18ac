use crate::error::{CalendarError, CalendarResult};
use crate::event::Event;
use crate::task::Task;
use std::collections::HashSet;

pub fn validate_task(task: &Task) -> CalendarResult<()> {
    if task.duration < chrono::Duration::zero() {
        return Err(CalendarError::NegativeDuration {
            name: task.name.clone(),
            minutes: task.duration.num_minutes(),
        });
    }
    Ok(())
}

pub fn validate_event(event: &Event) -> CalendarResult<()> {
    validate_task(&event.task)?;
    if event.end_time < event.start_time {
        return Err(CalendarError::InvalidTimeRange {
            name: event.task.name.clone(),
            start: event.start_time,
            end: event.end_time,
        });
    }
    Ok(())
}

/// Checks every task and rejects duplicate storage ids.
pub fn validate_task_collection(tasks: &[Task]) -> CalendarResult<()> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if let Some(id) = task.task_id() {
            if !seen_ids.insert(id) {
                return Err(CalendarError::InvalidArgument(format!(
                    "duplicate task id {id}"
                )));
            }
        }
        validate_task(task)?;
    }
    Ok(())
}

pub fn validate_event_collection(events: &[Event]) -> CalendarResult<()> {
    let mut seen_ids = HashSet::with_capacity(events.len());
    for event in events {
        if let Some(id) = event.event_id() {
            if !seen_ids.insert(id) {
                return Err(CalendarError::InvalidArgument(format!(
                    "duplicate event id {id}"
                )));
            }
        }
        validate_event(event)?;
    }
    Ok(())
}
