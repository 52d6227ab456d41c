//! Event types for exported calendar entries.
//!
//! This module provides the canonical record produced by normalization:
//! - [`NormalizedEvent`]: a flattened master event or occurrence instance
//! - [`AttendeeRecord`]: one attendee, with "is this me" detection applied
//! - [`EventDuration`]: the weeks/days/hours/minutes breakdown of an event's length

use chrono::TimeZone;
use serde::Serialize;

use crate::time::Timestamp;

/// The length of an event, broken down the way iCalendar durations are.
///
/// Weeks are only used when the length is a whole number of days divisible
/// by seven; in that case `days` is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventDuration {
    /// Whole weeks, when the length is a multiple of seven days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
    /// Whole days not absorbed into weeks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// Remaining hours.
    pub hours: u32,
    /// Remaining minutes.
    pub minutes: u32,
}

impl EventDuration {
    const SECONDS_PER_DAY: i64 = 86_400;

    /// Breaks the span between two instants into a duration.
    ///
    /// Returns `None` for zero-length spans. Seconds are truncated.
    pub fn between<A: TimeZone, B: TimeZone>(
        start: &chrono::DateTime<A>,
        end: &chrono::DateTime<B>,
    ) -> Option<Self> {
        let seconds = end
            .clone()
            .signed_duration_since(start.clone())
            .num_seconds()
            .abs();
        Self::from_seconds(seconds)
    }

    /// Breaks a number of seconds into a duration.
    pub fn from_seconds(seconds: i64) -> Option<Self> {
        if seconds == 0 {
            return None;
        }

        let seconds = seconds.abs();
        let total_days = seconds / Self::SECONDS_PER_DAY;
        let remainder = seconds % Self::SECONDS_PER_DAY;

        let (weeks, days) = if total_days > 0 && total_days % 7 == 0 {
            (Some(to_u32(total_days / 7)), None)
        } else if total_days > 0 {
            (None, Some(to_u32(total_days)))
        } else {
            (None, None)
        };

        Some(Self {
            weeks,
            days,
            hours: to_u32(remainder / 3600),
            minutes: to_u32((remainder % 3600) / 60),
        })
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// An attendee of a normalized event.
///
/// All descriptive fields are copied verbatim from the attendee's
/// parameters; absent parameters stay absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendeeRecord {
    /// Calendar user type (`CUTYPE`), e.g. `INDIVIDUAL` or `ROOM`.
    pub category: Option<String>,
    /// Participation role (`ROLE`), e.g. `REQ-PARTICIPANT`.
    pub role: Option<String>,
    /// Participation status (`PARTSTAT`), e.g. `ACCEPTED`.
    pub status: Option<String>,
    /// Common name (`CN`).
    pub common_name: Option<String>,
    /// Number of additional guests (`X-NUM-GUESTS`).
    pub guest_count: Option<String>,
    /// The calendar address the property points at, usually `mailto:...`.
    pub address: Option<String>,
    /// Whether the common name matches the configured author name or email.
    pub is_me: bool,
}

/// A calendar entry ready for rendering.
///
/// Built once per source component (master event or occurrence instance)
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    /// Identifier from the source calendar. Occurrences share their master's uid.
    pub uid: String,
    /// The event title; empty when absent.
    pub summary: String,
    /// Free-form description; empty when absent.
    pub description: String,
    /// Location text; empty when absent.
    pub location: String,
    /// Raw organizer address (e.g. `mailto:fred@bedrock.com`).
    pub organizer: Option<String>,
    /// Confirmation state (e.g. `CONFIRMED`); empty when absent.
    pub status: String,
    /// When the source component was last modified.
    pub last_modified: Option<Timestamp>,
    /// Event length; absent for instantaneous events.
    pub duration: Option<EventDuration>,
    /// Attendees in source order.
    pub attendees: Vec<AttendeeRecord>,
    /// Concrete start of this instance.
    pub start_date: Timestamp,
    /// Concrete end of this instance.
    pub end_date: Timestamp,
    /// Original instance start, for overrides of a single occurrence.
    pub recurrence_id: Option<Timestamp>,
}

impl NormalizedEvent {
    /// Creates a new event with required fields.
    ///
    /// `end_date` is clamped to `start_date` when it precedes it.
    pub fn new(uid: impl Into<String>, start_date: Timestamp, end_date: Timestamp) -> Self {
        let end_date = end_date.max(start_date);
        Self {
            uid: uid.into(),
            summary: String::new(),
            description: String::new(),
            location: String::new(),
            organizer: None,
            status: String::new(),
            last_modified: None,
            duration: EventDuration::between(&start_date, &end_date),
            attendees: Vec::new(),
            start_date,
            end_date,
            recurrence_id: None,
        }
    }

    /// Returns true if this record overrides one instance of a series.
    pub fn is_override(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the organizer.
    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder method to set the last modification time.
    pub fn with_last_modified(mut self, last_modified: Timestamp) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Builder method to override the computed duration.
    pub fn with_duration(mut self, duration: Option<EventDuration>) -> Self {
        self.duration = duration;
        self
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, attendee: AttendeeRecord) -> Self {
        self.attendees.push(attendee);
        self
    }

    /// Builder method to set attendees.
    pub fn with_attendees(mut self, attendees: Vec<AttendeeRecord>) -> Self {
        self.attendees = attendees;
        self
    }

    /// Builder method to set the recurrence id.
    pub fn with_recurrence_id(mut self, recurrence_id: Timestamp) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Tz::UTC.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    mod duration {
        use super::*;

        #[test]
        fn zero_length_has_no_duration() {
            assert_eq!(EventDuration::from_seconds(0), None);
            let t = at(2021, 8, 5, 12, 0);
            assert_eq!(EventDuration::between(&t, &t), None);
        }

        #[test]
        fn minutes_and_hours() {
            let d = EventDuration::between(&at(2021, 8, 5, 12, 30), &at(2021, 8, 5, 13, 20)).unwrap();
            assert_eq!(
                d,
                EventDuration {
                    weeks: None,
                    days: None,
                    hours: 0,
                    minutes: 50
                }
            );
        }

        #[test]
        fn single_day() {
            let d = EventDuration::between(&at(2021, 8, 6, 0, 0), &at(2021, 8, 7, 0, 0)).unwrap();
            assert_eq!(d.days, Some(1));
            assert_eq!(d.weeks, None);
            assert_eq!((d.hours, d.minutes), (0, 0));
        }

        #[test]
        fn whole_weeks_absorb_days() {
            let d = EventDuration::between(&at(2021, 8, 2, 9, 0), &at(2021, 8, 16, 11, 15)).unwrap();
            assert_eq!(d.weeks, Some(2));
            assert_eq!(d.days, None);
            assert_eq!((d.hours, d.minutes), (2, 15));
        }

        #[test]
        fn non_multiple_of_seven_stays_in_days() {
            let d = EventDuration::from_seconds(9 * 86_400 + 60).unwrap();
            assert_eq!(d.weeks, None);
            assert_eq!(d.days, Some(9));
            assert_eq!(d.minutes, 1);
        }

        #[test]
        fn seconds_are_truncated() {
            let d = EventDuration::from_seconds(59).unwrap();
            assert_eq!((d.hours, d.minutes), (0, 0));
        }
    }

    #[test]
    fn new_event_defaults() {
        let event = NormalizedEvent::new("uid-1", at(2021, 8, 5, 12, 30), at(2021, 8, 5, 13, 20));
        assert_eq!(event.uid, "uid-1");
        assert!(event.summary.is_empty());
        assert!(event.status.is_empty());
        assert!(event.organizer.is_none());
        assert!(event.attendees.is_empty());
        assert!(!event.is_override());
        assert_eq!(event.duration.map(|d| d.minutes), Some(50));
    }

    #[test]
    fn end_before_start_is_clamped() {
        let event = NormalizedEvent::new("uid-1", at(2021, 8, 5, 13, 0), at(2021, 8, 5, 12, 0));
        assert!(event.start_date <= event.end_date);
        assert_eq!(event.start_date, event.end_date);
        assert!(event.duration.is_none());
    }
}
