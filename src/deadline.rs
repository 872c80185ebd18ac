//! Due dates, including the "no deadline" sentinel.
//!
//! `Deadline::Anytime` behaves like positive infinity: it is later than every
//! concrete timestamp and equal only to itself. Ordering goes through
//! [`Deadline::compare`] rather than `PartialOrd`, so the sentinel semantics
//! stay visible at every call site.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<NaiveDateTime>", into = "Option<NaiveDateTime>")]
pub enum Deadline {
    At(NaiveDateTime),
    #[default]
    Anytime,
}

impl Deadline {
    pub fn is_anytime(&self) -> bool {
        matches!(self, Deadline::Anytime)
    }

    /// Concrete timestamp, `None` for `Anytime`.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Deadline::At(ts) => Some(*ts),
            Deadline::Anytime => None,
        }
    }

    /// Three-way comparison where `Anytime` sorts after every concrete value.
    pub fn compare(&self, other: &Deadline) -> Ordering {
        match (self, other) {
            (Deadline::Anytime, Deadline::Anytime) => Ordering::Equal,
            (Deadline::Anytime, Deadline::At(_)) => Ordering::Greater,
            (Deadline::At(_), Deadline::Anytime) => Ordering::Less,
            (Deadline::At(a), Deadline::At(b)) => a.cmp(b),
        }
    }

    /// Strictly earlier than `ts`. Never true for `Anytime`.
    pub fn is_before(&self, ts: NaiveDateTime) -> bool {
        self.compare(&Deadline::At(ts)) == Ordering::Less
    }

    /// Strictly later than `ts`. Always true for `Anytime`.
    pub fn is_after(&self, ts: NaiveDateTime) -> bool {
        self.compare(&Deadline::At(ts)) == Ordering::Greater
    }
}

impl From<NaiveDateTime> for Deadline {
    fn from(value: NaiveDateTime) -> Self {
        Deadline::At(value)
    }
}

impl From<Option<NaiveDateTime>> for Deadline {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map(Deadline::At).unwrap_or(Deadline::Anytime)
    }
}

impl From<Deadline> for Option<NaiveDateTime> {
    fn from(value: Deadline) -> Self {
        value.timestamp()
    }
}

/// Edge of the representable range an overflowing shift clamps to.
fn saturated(upward: bool) -> NaiveDateTime {
    if upward {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    }
}

impl Add<Duration> for Deadline {
    type Output = Deadline;

    fn add(self, rhs: Duration) -> Deadline {
        match self {
            Deadline::At(ts) => Deadline::At(
                ts.checked_add_signed(rhs)
                    .unwrap_or_else(|| saturated(rhs > Duration::zero())),
            ),
            Deadline::Anytime => Deadline::Anytime,
        }
    }
}

impl Sub<Duration> for Deadline {
    type Output = Deadline;

    fn sub(self, rhs: Duration) -> Deadline {
        match self {
            Deadline::At(ts) => Deadline::At(
                ts.checked_sub_signed(rhs)
                    .unwrap_or_else(|| saturated(rhs < Duration::zero())),
            ),
            Deadline::Anytime => Deadline::Anytime,
        }
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::At(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M")),
            Deadline::Anytime => write!(f, "anytime"),
        }
    }
}
