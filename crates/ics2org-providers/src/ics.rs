//! ICS/iCalendar parsing utilities.
//!
//! This module splits iCalendar (RFC 5545) text into [`CalendarComponent`]s
//! and resolves date, date-time and duration values.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold};
use ics2org_core::Timestamp;
use ics2org_core::time::{resolve_local, start_of_day};
use regex::Regex;
use tracing::{debug, warn};

use crate::component::{CalendarComponent, Property};
use crate::error::{ProviderError, ProviderResult};

/// Regex for RFC 5545 durations, e.g. `P1W`, `PT1H30M`, `-P2DT12H`.
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("Invalid duration regex")
});

/// A resolved iCalendar time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcalTime {
    /// The concrete instant, expressed in `zone`.
    pub instant: Timestamp,
    /// The zone the value was written in. Recurrences expand in this zone.
    pub zone: Tz,
    /// Whether the value was a bare date.
    pub all_day: bool,
}

/// Parses ICS content and returns every `VEVENT`, in source order.
///
/// # Errors
///
/// Returns an `InvalidCalendar` error if the text is not iCalendar data.
pub fn parse_components(ics: &str) -> ProviderResult<Vec<CalendarComponent>> {
    if !ics.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
        return Err(ProviderError::invalid_calendar(
            "no VCALENDAR block found in calendar data",
        ));
    }

    let unfolded = unfold(ics);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| ProviderError::invalid_calendar(format!("failed to parse ICS content: {}", e)))?;

    let mut events = Vec::new();
    for component in &calendar.components {
        collect_events(component, &mut events);
    }

    debug!(count = events.len(), "Parsed VEVENT components");
    Ok(events)
}

/// Walks a parsed component tree and converts every `VEVENT`.
fn collect_events(component: &icalendar::parser::Component<'_>, out: &mut Vec<CalendarComponent>) {
    if component.name.as_str().eq_ignore_ascii_case("VEVENT") {
        let mut event = CalendarComponent::new();
        for prop in &component.properties {
            let mut property = Property::new(prop.name.as_str(), prop.val.as_str());
            for param in &prop.params {
                let value = param.val.as_ref().map(|v| v.as_str()).unwrap_or_default();
                property = property.with_param(param.key.as_str(), value);
            }
            event.push(property);
        }
        out.push(event);
    }

    for child in &component.components {
        collect_events(child, out);
    }
}

/// Resolves a date or date-time property.
///
/// For list-valued properties (`EXDATE`, `RDATE`) only the first entry is used.
pub fn parse_ical_time(property: &Property, display: &Tz) -> Option<IcalTime> {
    let first = property.value().split(',').next()?;
    parse_ical_time_value(first, property, display)
}

/// Resolves every entry of a list-valued date property.
pub fn parse_ical_time_list(property: &Property, display: &Tz) -> Vec<IcalTime> {
    property
        .value()
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .filter_map(|v| parse_ical_time_value(v, property, display))
        .collect()
}

/// Resolves a single date or date-time string using the property's parameters.
///
/// Handles formats like:
/// - 20250205T100000Z (UTC)
/// - 20250205T100000 with TZID (zoned)
/// - 20250205T100000 (floating, resolved in `display`)
/// - 20250205 (date only, midnight in `display`)
fn parse_ical_time_value(value: &str, property: &Property, display: &Tz) -> Option<IcalTime> {
    let s = value.trim();

    // Date only (YYYYMMDD)
    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(s, "%Y%m%d").ok()?;
        return Some(IcalTime {
            instant: start_of_day(date, display),
            zone: *display,
            all_day: true,
        });
    }

    // DateTime with Z suffix (UTC)
    if let Some(utc) = s.strip_suffix('Z') {
        let dt = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(IcalTime {
            instant: Utc.from_utc_datetime(&dt).with_timezone(&Tz::UTC),
            zone: Tz::UTC,
            all_day: false,
        });
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
    let zone = property
        .param("TZID")
        .map(|tzid| resolve_tzid(tzid, display))
        .unwrap_or(*display);

    Some(IcalTime {
        instant: resolve_local(naive, &zone),
        zone,
        all_day: false,
    })
}

/// Maps a TZID parameter to an IANA zone.
///
/// Unknown identifiers fall back to the display zone.
fn resolve_tzid(tzid: &str, display: &Tz) -> Tz {
    let candidate = tzid.trim().trim_start_matches('/');
    if let Ok(tz) = Tz::from_str(candidate) {
        return tz;
    }

    // Vendor-prefixed identifiers such as `/mozilla.org/20050126_1/America/New_York`.
    let segments: Vec<&str> = candidate.split('/').collect();
    if segments.len() > 2 {
        let tail = segments[segments.len() - 2..].join("/");
        if let Ok(tz) = Tz::from_str(&tail) {
            return tz;
        }
    }

    let fallback = display.name();
    warn!(tzid, fallback, "Unknown TZID, using display timezone");
    *display
}

/// Parses an RFC 5545 duration value.
///
/// Returns `None` for malformed values and for values too large to represent.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let caps = DURATION_REGEX.captures(value.trim())?;
    let part = |i: usize| -> Option<i64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<i64>().ok(),
            None => Some(0),
        }
    };

    let total = Duration::try_weeks(part(2)?)?
        .checked_add(&Duration::try_days(part(3)?)?)?
        .checked_add(&Duration::try_hours(part(4)?)?)?
        .checked_add(&Duration::try_minutes(part(5)?)?)?
        .checked_add(&Duration::try_seconds(part(6)?)?)?;

    if caps.get(1).is_some_and(|m| m.as_str() == "-") {
        Some(-total)
    } else {
        Some(total)
    }
}
