use crate::deadline::Deadline;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{ALL_WEEKDAYS, Event};
use crate::persistence::{PersistenceResult, TaskStore};
use crate::task::Task;
use crate::validation;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const BREAK_NAME: &str = "BREAK";

/// Length of the break inserted after every assigned task.
pub fn default_break() -> Duration {
    Duration::minutes(15)
}

/// Gap between "now" and the first assigned task.
pub fn default_headstart() -> Duration {
    Duration::minutes(5)
}

/// Two events whose intervals overlap. `earlier` ends first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub earlier: Event,
    pub later: Event,
}

/// Running tally of what is actually happening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calendar {
    tasks: Vec<Task>,
    definite_events: Vec<Event>,
    recurring_events: Vec<Event>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn definite_events(&self) -> &[Event] {
        &self.definite_events
    }

    pub fn recurring_events(&self) -> &[Event] {
        &self.recurring_events
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.definite_events.iter().chain(self.recurring_events.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.definite_events.is_empty() && self.recurring_events.is_empty()
    }

    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        due_date: impl Into<Deadline>,
        priority: i32,
    ) -> CalendarResult<&Task> {
        let task = Task::new(name)
            .with_duration(duration)
            .with_due_date(due_date)
            .with_priority(priority);
        self.push_task(task)
    }

    pub fn push_task(&mut self, task: Task) -> CalendarResult<&Task> {
        validation::validate_task(&task)?;
        log::debug!("adding task '{}' due {}", task.name, task.due_date);
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Recurring events go to the weekly list, everything else is definite.
    pub fn add_event(&mut self, event: Event) {
        if event.is_recurring() {
            log::debug!("adding recurring event '{}'", event.name());
            self.recurring_events.push(event);
        } else {
            log::debug!("adding definite event '{}'", event.name());
            self.definite_events.push(event);
        }
    }

    /// Recurring events per weekday (Monday first), sorted by end time-of-day.
    pub fn recurring_event_days(&self) -> Vec<(Weekday, Vec<&Event>)> {
        ALL_WEEKDAYS
            .into_iter()
            .map(|day| {
                let mut events: Vec<&Event> = self
                    .recurring_events
                    .iter()
                    .filter(|event| event.occurs_on(day))
                    .collect();
                events.sort_by_key(|event| event.end_time.time());
                (day, events)
            })
            .collect()
    }

    /// True when two recurring events overlap on a shared weekday.
    pub fn check_recurring_conflict(&self) -> bool {
        for (day, events) in self.recurring_event_days() {
            for pair in events.windows(2) {
                if pair[0].end_time.time() > pair[1].start_time.time() {
                    log::warn!(
                        "recurring events '{}' and '{}' overlap on {}",
                        pair[0].name(),
                        pair[1].name(),
                        day
                    );
                    return true;
                }
            }
        }
        false
    }

    /// True when any two events overlap, recurring occurrences included.
    pub fn check_all_conflict(&self) -> bool {
        if self.check_recurring_conflict() {
            return true;
        }
        let timeline = self.timeline();
        for pair in timeline.windows(2) {
            if pair[0].end_time > pair[1].start_time {
                log::warn!(
                    "events '{}' and '{}' overlap at {}",
                    pair[0].name(),
                    pair[1].name(),
                    pair[1].start_time
                );
                return true;
            }
        }
        false
    }

    /// Every overlapping neighbour pair, recurring weekday clashes first.
    pub fn find_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for (_, events) in self.recurring_event_days() {
            for pair in events.windows(2) {
                if pair[0].end_time.time() > pair[1].start_time.time() {
                    conflicts.push(Conflict {
                        earlier: pair[0].clone(),
                        later: pair[1].clone(),
                    });
                }
            }
        }
        let timeline = self.timeline();
        for pair in timeline.windows(2) {
            // weekday clashes were already reported above
            let both_recurring = pair[0].is_recurring() && pair[1].is_recurring();
            if !both_recurring && pair[0].end_time > pair[1].start_time {
                conflicts.push(Conflict {
                    earlier: pair[0].clone(),
                    later: pair[1].clone(),
                });
            }
        }
        conflicts
    }

    /// Dates spanned by definite events.
    fn definite_dates(&self) -> BTreeSet<NaiveDate> {
        self.definite_events
            .iter()
            .flat_map(|event| event.dates())
            .collect()
    }

    /// Definite events plus recurring occurrences on their dates, by end time.
    fn timeline(&self) -> Vec<Event> {
        let mut all_events = self.definite_events.clone();
        for date in self.definite_dates() {
            let weekday = date.weekday();
            all_events.extend(
                self.recurring_events
                    .iter()
                    .filter(|event| event.occurs_on(weekday))
                    .filter_map(|event| event.occurrence_on(date)),
            );
        }
        all_events.sort_by_key(|event| event.end_time);
        all_events
    }

    /// Sort tasks earliest-due-date first, ties by priority then shorter duration.
    pub fn sort_tasks(&mut self) {
        self.tasks.sort_by(|a, b| {
            a.due_date
                .compare(&b.due_date)
                .then(a.priority.cmp(&b.priority))
                .then(a.duration.cmp(&b.duration))
        });
    }

    /// Sequence every pending task back to back starting shortly after now.
    ///
    /// Existing events are not consulted and due dates are not checked after
    /// sorting, so later tasks may land past their deadline.
    pub fn assign_tasks(&mut self, break_time: Duration) -> CalendarResult<Vec<Event>> {
        let start = Local::now().naive_local() + default_headstart();
        self.assign_tasks_from(start, break_time)
    }

    /// Like [`Calendar::assign_tasks`] with an explicit first start time.
    pub fn assign_tasks_from(
        &mut self,
        start: NaiveDateTime,
        break_time: Duration,
    ) -> CalendarResult<Vec<Event>> {
        if break_time < Duration::zero() {
            return Err(CalendarError::InvalidArgument(format!(
                "break time must not be negative (got {} minutes)",
                break_time.num_minutes()
            )));
        }
        self.sort_tasks();
        let break_task = Task::new(BREAK_NAME).with_duration(break_time);
        let mut events = Vec::with_capacity(self.tasks.len() * 2);
        let mut start = start;
        for task in &self.tasks {
            let work = Event::starting_at(task.clone(), start)?;
            let rest = Event::starting_at(break_task.clone(), work.end_time)?;
            start = rest.end_time;
            events.push(work);
            events.push(rest);
        }
        log::debug!(
            "assigned {} tasks, schedule ends at {}",
            self.tasks.len(),
            start
        );
        Ok(events)
    }

    /// Full scheduler over definite, recurring and unassigned work.
    pub fn assign_all_events(&mut self, _break_time: Duration) -> CalendarResult<Vec<Event>> {
        if self.check_recurring_conflict() {
            return Err(CalendarError::Infeasible(
                "recurring events already overlap".into(),
            ));
        }
        Err(CalendarError::NotImplemented("assign_all_events"))
    }

    /// Rebuild a calendar from storage.
    ///
    /// Task rows owned by an event are not treated as unassigned tasks.
    pub fn load_from<S: TaskStore + ?Sized>(store: &S) -> PersistenceResult<Self> {
        let events = store.get_events()?;
        validation::validate_event_collection(&events)?;
        let owned: HashSet<_> = events.iter().filter_map(Event::task_id).collect();

        let mut calendar = Calendar::new();
        for task in store.get_tasks()? {
            if task.task_id().is_some_and(|id| owned.contains(&id)) {
                continue;
            }
            calendar.push_task(task)?;
        }
        for event in events {
            calendar.add_event(event);
        }
        log::info!(
            "loaded {} tasks, {} definite and {} recurring events",
            calendar.tasks.len(),
            calendar.definite_events.len(),
            calendar.recurring_events.len()
        );
        Ok(calendar)
    }

    /// Persist everything, binding the ids the store hands back.
    ///
    /// Items are updated in place, so a failing store call leaves the
    /// calendar intact with the ids bound so far.
    pub fn save_to<S: TaskStore + ?Sized>(&mut self, store: &S) -> PersistenceResult<()> {
        for task in &mut self.tasks {
            let task_id = store.add_task(task)?;
            task.bind_task_id(task_id);
        }
        let events = self
            .definite_events
            .iter_mut()
            .chain(self.recurring_events.iter_mut());
        for event in events {
            let task_id = store.add_task(&event.task)?;
            event.task.bind_task_id(task_id);
            let event_id = store.add_event(event)?;
            event.bind_event_id(event_id);
        }
        log::info!("saved calendar to store");
        Ok(())
    }

    pub(crate) fn from_parts(tasks: Vec<Task>, events: Vec<Event>) -> CalendarResult<Self> {
        validation::validate_task_collection(&tasks)?;
        validation::validate_event_collection(&events)?;
        let mut calendar = Calendar {
            tasks,
            ..Calendar::default()
        };
        for event in events {
            calendar.add_event(event);
        }
        Ok(calendar)
    }
}
