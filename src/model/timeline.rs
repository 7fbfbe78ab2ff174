use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unit in which task offsets and durations are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Days,
    Hours,
}

impl TimeUnit {
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
        }
    }

    /// Length of `amount` units as a chrono duration, `None` if out of range.
    pub fn to_duration(&self, amount: i64) -> Option<Duration> {
        match self {
            TimeUnit::Days => Duration::try_days(amount),
            TimeUnit::Hours => Duration::try_hours(amount),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            "hours" | "hour" | "h" => Ok(TimeUnit::Hours),
            other => Err(format!("unknown time unit '{other}'")),
        }
    }
}

/// Maps project offsets onto the calendar, anchored at `epoch`.
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    /// Calendar instant that offset 0 corresponds to.
    pub epoch: DateTime<Utc>,
    pub unit: TimeUnit,
}

impl Timeline {
    pub fn new(epoch: DateTime<Utc>, unit: TimeUnit) -> Self {
        Self { epoch, unit }
    }

    /// Convert an offset to a calendar instant, rounding partial units up.
    /// `None` when the instant falls outside chrono's representable range.
    pub fn offset_to_date(&self, offset: f64) -> Option<DateTime<Utc>> {
        let whole = offset.max(0.0).ceil();
        if !whole.is_finite() || whole >= i64::MAX as f64 {
            return None;
        }
        let span = self.unit.to_duration(whole as i64)?;
        self.epoch.checked_add_signed(span)
    }

    /// Estimated completion date for a schedule ending at `end`.
    /// `None` when nothing is scheduled or the date is out of range.
    pub fn completion(&self, end: Option<f64>) -> Option<DateTime<Utc>> {
        end.and_then(|e| self.offset_to_date(e))
    }
}
