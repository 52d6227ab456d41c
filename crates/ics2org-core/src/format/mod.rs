//! Org-mode formatting for normalized events.
//!
//! This module provides the pure text utilities the document is built from:
//! - [`format_duration`]: `1 d 02:30 hh:mm` style durations
//! - [`format_timestamp`]: active `<...>` and inactive `[...]` org timestamps
//! - [`format_range`]: start/end pairs, collapsed when on the same day
//!
//! The [`document`] submodule assembles these into the final file.
//!
//! # Example
//!
//! ```rust
//! use chrono::TimeZone;
//! use chrono_tz::Tz;
//! use ics2org_core::format::{format_range, format_timestamp, TimestampKind};
//!
//! let start = Tz::UTC.with_ymd_and_hms(2021, 8, 5, 12, 30, 0).unwrap();
//! let end = Tz::UTC.with_ymd_and_hms(2021, 8, 5, 13, 20, 0).unwrap();
//!
//! assert_eq!(format_range(&start, &end), "<2021-08-05 Thu 12:30-13:20>");
//! assert_eq!(
//!     format_timestamp(Some(&start), TimestampKind::Inactive),
//!     "[2021-08-05 Thu 12:30]"
//! );
//! ```

pub mod document;


use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::event::{EventDuration, NormalizedEvent};

/// Date and time layout shared by every org timestamp.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %a %H:%M";
const CLOCK_FORMAT: &str = "%H:%M";

/// The output format for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Org-mode agenda file.
    #[default]
    Org,
    /// Machine-readable JSON array of normalized events.
    Json,
}

impl OutputFormat {
    /// Returns the canonical name of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "org" => Ok(Self::Org),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format `{}` (expected org or json)", other)),
        }
    }
}

/// Whether a timestamp shows up in the org agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampKind {
    /// Rendered as `<...>`; shows up in the agenda.
    #[default]
    Active,
    /// Rendered as `[...]`; informational only.
    Inactive,
}

impl TimestampKind {
    fn brackets(self) -> (char, char) {
        match self {
            Self::Active => ('<', '>'),
            Self::Inactive => ('[', ']'),
        }
    }
}

/// Formats an event duration.
///
/// The weeks branch prints the hours value in both clock slots and never
/// shows minutes, matching existing agenda files produced by this format.
pub fn format_duration(duration: &EventDuration) -> String {
    match (duration.weeks, duration.days) {
        (Some(weeks), days) if weeks > 0 => format!(
            "{} wk {} d {:02}:{:02} hh:mm",
            weeks,
            days.unwrap_or(0),
            duration.hours,
            duration.hours
        ),
        (_, Some(days)) if days > 0 => format!(
            "{} d {:02}:{:02} hh:mm",
            days, duration.hours, duration.minutes
        ),
        _ => format!("{:02}:{:02} hh:mm", duration.hours, duration.minutes),
    }
}

/// Formats an instant as an org timestamp, e.g. `<2021-08-06 Fri 00:00>`.
///
/// An absent instant yields an empty string.
pub fn format_timestamp<Tz>(instant: Option<&DateTime<Tz>>, kind: TimestampKind) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let Some(instant) = instant else {
        return String::new();
    };
    let (open, close) = kind.brackets();
    format!("{}{}{}", open, instant.format(TIMESTAMP_FORMAT), close)
}

/// Formats the span of an event.
///
/// Spans starting and ending on the same calendar day collapse into a single
/// timestamp with a time range (`<2021-08-05 Thu 12:30-13:20>`); any other
/// span renders two active timestamps joined by `--`.
pub fn format_range<Tz>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if start.date_naive() == end.date_naive() {
        format!(
            "<{}-{}>",
            start.format(TIMESTAMP_FORMAT),
            end.format(CLOCK_FORMAT)
        )
    } else {
        format!(
            "{}--{}",
            format_timestamp(Some(start), TimestampKind::Active),
            format_timestamp(Some(end), TimestampKind::Active)
        )
    }
}

/// Serializes events as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(events: &[NormalizedEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(events)
}
