use crate::deadline::Deadline;
use crate::error::{CalendarError, CalendarResult};
use crate::task::{Task, TaskId};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned identifier of an event row.
pub type EventId = i64;

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Weekdays an event recurs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhichDays {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl WhichDays {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut which = Self::default();
        for day in days {
            which.set(day, true);
        }
        which
    }

    pub fn get(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn set(&mut self, day: Weekday, value: bool) {
        let slot = match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *slot = value;
    }

    pub fn any(&self) -> bool {
        ALL_WEEKDAYS.iter().any(|day| self.get(*day))
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.into_iter().filter(|day| self.get(*day))
    }

    /// Flags in Monday..Sunday order, the column order used by storage.
    pub fn to_flags(&self) -> [bool; 7] {
        ALL_WEEKDAYS.map(|day| self.get(day))
    }

    pub fn from_flags(flags: [bool; 7]) -> Self {
        let mut which = Self::default();
        for (day, flag) in ALL_WEEKDAYS.into_iter().zip(flags) {
            which.set(day, flag);
        }
        which
    }

    /// Parse a comma separated list such as `mon,wed,fri`.
    pub fn parse_list(input: &str) -> Option<Self> {
        let mut which = Self::default();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day: Weekday = part.parse().ok()?;
            which.set(day, true);
        }
        Some(which)
    }
}

impl fmt::Display for WhichDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.days().map(|day| day.to_string()).collect::<Vec<_>>();
        write!(f, "{}", days.join(","))
    }
}

/// A task presumed to be happening at a given time, possibly every week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub task: Task,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub which_days: WhichDays,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_id: Option<EventId>,
}

impl Event {
    /// Bind `task` to a time slot. `end_time` defaults to `start_time + duration`.
    pub fn new(
        task: Task,
        start_time: NaiveDateTime,
        end_time: Option<NaiveDateTime>,
        which_days: WhichDays,
    ) -> CalendarResult<Self> {
        let end_time = match end_time {
            Some(end_time) => end_time,
            None => task.time_after(start_time)?,
        };
        let event = Self {
            task,
            start_time,
            end_time,
            which_days,
            event_id: None,
        };
        crate::validation::validate_event(&event)?;
        Ok(event)
    }

    /// Event starting at `start_time` for the task's own duration.
    pub(crate) fn starting_at(task: Task, start_time: NaiveDateTime) -> CalendarResult<Self> {
        let end_time = task.time_after(start_time)?;
        Ok(Self {
            task,
            start_time,
            end_time,
            which_days: WhichDays::none(),
            event_id: None,
        })
    }

    pub(crate) fn bind_event_id(&mut self, event_id: EventId) {
        if self.event_id.is_none() {
            self.event_id = Some(event_id);
        }
    }

    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        if self.event_id.is_none() {
            self.event_id = Some(event_id);
        }
        self
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task.task_id()
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }

    pub fn duration(&self) -> Duration {
        self.task.duration
    }

    pub fn due_date(&self) -> Deadline {
        self.task.due_date
    }

    pub fn priority(&self) -> i32 {
        self.task.priority
    }

    pub fn last_chance(&self) -> Deadline {
        self.task.last_chance()
    }

    pub fn slack(&self, start: NaiveDateTime) -> Option<Duration> {
        self.task.slack(start)
    }

    pub fn is_recurring(&self) -> bool {
        self.which_days.any()
    }

    pub fn occurs_on(&self, day: Weekday) -> bool {
        self.which_days.get(day)
    }

    /// Concrete occurrence of this recurring event on `date`.
    pub fn generate_recurring(&self, date: NaiveDate) -> CalendarResult<Event> {
        let weekday = date.weekday();
        if !self.occurs_on(weekday) {
            return Err(CalendarError::NotRecurringOn {
                name: self.task.name.clone(),
                weekday,
            });
        }
        self.occurrence_on(date).ok_or_else(|| {
            CalendarError::InvalidArgument(format!(
                "occurrence of {} on {} ends out of range",
                self.task.name, date
            ))
        })
    }

    /// Unpersisted copy of this slot on `date`, keeping the `end - start` span.
    pub(crate) fn occurrence_on(&self, date: NaiveDate) -> Option<Event> {
        let start_time = date.and_time(self.start_time.time());
        let end_time = start_time.checked_add_signed(self.end_time - self.start_time)?;
        Some(Event {
            task: self.task.clone(),
            start_time,
            end_time,
            which_days: self.which_days,
            event_id: None,
        })
    }

    /// Every calendar date touched by `[start_time, end_time]`, inclusive.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.start_time.date();
        let span = (self.end_time.date() - first).num_days().max(0);
        (0..=span).map(move |offset| first + Duration::days(offset))
    }

    pub fn overlaps(&self, other: &Event) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        if !(self.is_recurring() && other.is_recurring()) {
            return self.task == other.task
                && self.start_time == other.start_time
                && self.end_time == other.end_time
                && self.which_days == other.which_days
                && self.event_id == other.event_id;
        }
        self.task.name == other.task.name
            && self.which_days == other.which_days
            && self.start_time.time() == other.start_time.time()
            && self.end_time.time() == other.end_time.time()
    }
}
