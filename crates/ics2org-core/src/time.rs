//! Time types for the export pipeline.
//!
//! This module provides the [`Timestamp`] alias used by every normalized
//! record, and [`TimeWindow`] for describing the bounded date range an
//! export covers.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

/// A concrete point in time, expressed in the zone the document is rendered in.
pub type Timestamp = DateTime<Tz>;

/// Resolves a wall-clock time in `tz` to a concrete instant.
///
/// Ambiguous local times (DST fold) resolve to the earlier instant. Times
/// inside a DST gap are shifted forward by the gap length.
pub fn resolve_local(naive: NaiveDateTime, tz: &Tz) -> Timestamp {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}

/// Returns midnight of `date` in `tz`.
pub fn start_of_day(date: NaiveDate, tz: &Tz) -> Timestamp {
    resolve_local(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// The date window an export covers.
///
/// Both bounds are inclusive: an event overlaps the window when it starts at
/// or before `end` and ends at or after `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: Timestamp,
    /// End of the window (inclusive).
    pub end: Timestamp,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `start` is after `end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Creates a window covering the whole days `first` through `last` in
    /// `tz`: from midnight of `first` to the midnight that ends `last`.
    ///
    /// Returns `None` if `first` is after `last`.
    pub fn for_dates(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Option<Self> {
        if first > last {
            return None;
        }
        let after_last = last.checked_add_days(Days::new(1))?;
        Self::new(start_of_day(first, tz), start_of_day(after_last, tz))
    }

    /// Returns the zone the window bounds are expressed in.
    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    /// Checks whether the span `[start, end]` overlaps this window.
    pub fn overlaps<A: TimeZone, B: TimeZone>(&self, start: &DateTime<A>, end: &DateTime<B>) -> bool {
        *start <= self.end && *end >= self.start
    }
}
