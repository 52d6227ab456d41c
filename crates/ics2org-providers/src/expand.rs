//! Recurrence expansion.
//!
//! This module defines the [`CalendarExpander`] trait, which splits raw
//! calendar text into the master events and occurrence instances that
//! overlap a [`TimeWindow`], and [`IcsExpander`], its iCalendar implementation.
//!
//! Expansion rules:
//! - Non-recurring events overlapping the window are master events, in source order.
//! - Recurring series (`RRULE`/`RDATE`) are expanded, minus `EXDATE`, in the
//!   series' own zone; every instance overlapping the window is an occurrence.
//! - A component with `RECURRENCE-ID` replaces the instance of its series
//!   that starts at that instant. Without a series in the file it is an
//!   ordinary master event.

use std::sync::Arc;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use ics2org_core::time::resolve_local;
use ics2org_core::{TimeWindow, Timestamp};
use rrule::{RRule, RRuleSet, Unvalidated};
use tracing::{debug, info, warn};

use crate::component::CalendarComponent;
use crate::error::{ProviderError, ProviderResult};
use crate::ics::{IcalTime, parse_components, parse_duration, parse_ical_time, parse_ical_time_list};

/// Default cap on generated instances per series.
pub const DEFAULT_MAX_OCCURRENCES: u16 = 1000;

/// A non-recurring event with its resolved span.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterEvent {
    /// The source component.
    pub component: CalendarComponent,
    /// Resolved start, in the window's zone.
    pub start: Timestamp,
    /// Resolved end, in the window's zone.
    pub end: Timestamp,
}

/// One concrete instance of a recurring series.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// The series definition.
    pub master: Arc<CalendarComponent>,
    /// The component replacing this instance, if any.
    pub override_component: Option<CalendarComponent>,
    /// Resolved start, in the window's zone.
    pub start: Timestamp,
    /// Resolved end, in the window's zone.
    pub end: Timestamp,
    /// The original instance start, set when the instance is overridden.
    pub recurrence_id: Option<Timestamp>,
}

impl Occurrence {
    /// Returns the component the instance's fields are read from.
    pub fn component(&self) -> &CalendarComponent {
        self.override_component.as_ref().unwrap_or(self.master.as_ref())
    }
}

/// The result of expanding a calendar over a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedCalendar {
    /// Master events, in source order.
    pub events: Vec<MasterEvent>,
    /// Occurrence instances, grouped by series in source order.
    pub occurrences: Vec<Occurrence>,
}

impl ExpandedCalendar {
    /// Returns the total number of entries.
    pub fn len(&self) -> usize {
        self.events.len() + self.occurrences.len()
    }

    /// Returns true if nothing overlaps the window.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns raw calendar text into master events and occurrences for a window.
pub trait CalendarExpander: Send + Sync {
    /// Expands `raw` over `window`.
    ///
    /// # Errors
    ///
    /// Fails when the calendar text or a recurrence rule cannot be parsed.
    fn expand(&self, raw: &str, window: &TimeWindow) -> ProviderResult<ExpandedCalendar>;
}

/// iCalendar expander backed by the `rrule` crate.
#[derive(Debug, Clone)]
pub struct IcsExpander {
    max_occurrences: u16,
}

impl Default for IcsExpander {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

impl IcsExpander {
    /// Creates an expander with the default instance cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the instance cap per series.
    pub fn with_max_occurrences(mut self, max_occurrences: u16) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    /// Expands one series into the occurrences overlapping `window`.
    fn expand_series(
        &self,
        master: Arc<CalendarComponent>,
        window: &TimeWindow,
        overrides: &mut [PendingOverride],
    ) -> ProviderResult<Vec<Occurrence>> {
        let display = window.timezone();
        let uid = master.uid().to_string();
        let Some(span) = EventSpan::resolve(&master, &display) else {
            warn!(uid = %uid, "Recurring event without a usable DTSTART, skipping");
            return Ok(Vec::new());
        };
        let length = span.length();

        let instances = self.instances(&master, &span, window)?;
        debug!(uid = %uid, count = instances.len(), "Expanded series");

        let mut occurrences = Vec::new();
        for instance in instances {
            let override_component = overrides
                .iter_mut()
                .find(|o| !o.used && o.uid == uid && o.recurrence_id == instance)
                .map(|o| {
                    o.used = true;
                    o.component.clone()
                });

            let occurrence = match override_component {
                Some(component) => {
                    let (start, end) = match EventSpan::resolve(&component, &display) {
                        Some(own) => (own.start, own.end),
                        None => (instance, end_after(instance, length)),
                    };
                    Occurrence {
                        master: Arc::clone(&master),
                        override_component: Some(component),
                        start,
                        end,
                        recurrence_id: Some(instance),
                    }
                }
                None => Occurrence {
                    master: Arc::clone(&master),
                    override_component: None,
                    start: instance,
                    end: end_after(instance, length),
                    recurrence_id: None,
                },
            };

            if window.overlaps(&occurrence.start, &occurrence.end) {
                occurrences.push(occurrence);
            }
        }

        // Overrides moved into the window from an instance outside it.
        for pending in overrides.iter_mut().filter(|o| !o.used && o.uid == uid) {
            let Some(own) = EventSpan::resolve(&pending.component, &display) else {
                continue;
            };
            pending.used = true;
            if window.overlaps(&own.start, &own.end) {
                occurrences.push(Occurrence {
                    master: Arc::clone(&master),
                    override_component: Some(pending.component.clone()),
                    start: own.start,
                    end: own.end,
                    recurrence_id: Some(pending.recurrence_id),
                });
            }
        }

        Ok(occurrences)
    }

    /// Returns the instance starts of a series that can overlap `window`,
    /// in the window's zone.
    fn instances(
        &self,
        master: &CalendarComponent,
        span: &EventSpan,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<Timestamp>> {
        let display = window.timezone();
        let zone = rrule::Tz::Tz(span.zone);
        let dtstart = span.start.with_timezone(&zone);
        let length = span.length();

        let mut set = RRuleSet::new(dtstart);
        let mut has_rule = false;
        for property in master.properties_named("RRULE") {
            let text = until_as_utc(property.value(), &span.zone);
            let unvalidated: RRule<Unvalidated> = text.parse().map_err(|e| {
                ProviderError::invalid_recurrence(format!("invalid RRULE '{}'", property.value()))
                    .with_origin(master.uid())
                    .with_source(e)
            })?;
            let rule = unvalidated.validate(dtstart).map_err(|e| {
                ProviderError::invalid_recurrence(format!("invalid RRULE '{}'", property.value()))
                    .with_origin(master.uid())
                    .with_source(e)
            })?;
            set = set.rrule(rule);
            has_rule = true;
        }
        if !has_rule {
            set = set.rdate(dtstart);
        }
        for property in master.properties_named("RDATE") {
            for time in parse_ical_time_list(property, &span.zone) {
                set = set.rdate(time.instant.with_timezone(&zone));
            }
        }
        for property in master.properties_named("EXDATE") {
            for time in parse_ical_time_list(property, &span.zone) {
                set = set.exdate(time.instant.with_timezone(&zone));
            }
        }

        let lower = window
            .start
            .checked_sub_signed(length)
            .unwrap_or(span.start)
            .with_timezone(&zone);
        let upper = window.end.with_timezone(&zone);
        let result = set.after(lower).before(upper).all(self.max_occurrences);
        if result.limited {
            warn!(
                uid = master.uid(),
                max = self.max_occurrences,
                "Series truncated at the occurrence limit"
            );
        }

        Ok(result
            .dates
            .into_iter()
            .map(|date| date.with_timezone(&display))
            .collect())
    }
}

impl CalendarExpander for IcsExpander {
    fn expand(&self, raw: &str, window: &TimeWindow) -> ProviderResult<ExpandedCalendar> {
        let display = window.timezone();
        let components = parse_components(raw)?;

        let series_uids: Vec<String> = components
            .iter()
            .filter(|c| c.is_recurring() && !c.is_override())
            .map(|c| c.uid().to_string())
            .collect();

        let mut expanded = ExpandedCalendar::default();
        let mut series = Vec::new();
        let mut overrides = Vec::new();

        for component in components {
            if component.is_override() && series_uids.iter().any(|uid| uid == component.uid()) {
                let recurrence_id = component
                    .property("RECURRENCE-ID")
                    .and_then(|p| parse_ical_time(p, &display));
                match recurrence_id {
                    Some(time) => {
                        overrides.push(PendingOverride {
                            uid: component.uid().to_string(),
                            recurrence_id: time.instant.with_timezone(&display),
                            component,
                            used: false,
                        });
                        continue;
                    }
                    None => {
                        warn!(uid = component.uid(), "Unparseable RECURRENCE-ID, treating as a single event");
                    }
                }
            } else if component.is_recurring() && !component.is_override() {
                series.push(Arc::new(component));
                continue;
            }

            match EventSpan::resolve(&component, &display) {
                Some(span) if window.overlaps(&span.start, &span.end) => {
                    expanded.events.push(MasterEvent {
                        start: span.start,
                        end: span.end,
                        component,
                    });
                }
                Some(_) => {}
                None => warn!(uid = component.uid(), "Event without a usable DTSTART, skipping"),
            }
        }

        for master in series {
            let occurrences = self.expand_series(master, window, &mut overrides)?;
            expanded.occurrences.extend(occurrences);
        }

        info!(
            events = expanded.events.len(),
            occurrences = expanded.occurrences.len(),
            "Expanded calendar"
        );
        Ok(expanded)
    }
}

/// Returns the end of an instance starting at `start`, or `start` itself
/// when the length is out of range.
fn end_after(start: Timestamp, length: Duration) -> Timestamp {
    start.checked_add_signed(length).unwrap_or(start)
}

/// Rewrites a date or floating `UNTIL` as a UTC date-time, reading it in
/// `zone`. A date `UNTIL` includes the whole day.
///
/// Rules are validated against a zoned `DTSTART`, which only allows a UTC
/// `UNTIL`. Values that cannot be read are left for validation to reject.
fn until_as_utc(rule: &str, zone: &Tz) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with(['Z', 'z']) => {
                match local_until(value, zone) {
                    Some(until) => format!("{}={}", key, until.format("%Y%m%dT%H%M%SZ")),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn local_until(value: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let naive = if value.len() == 8 {
        NaiveDate::parse_from_str(value, "%Y%m%d").ok()?.and_hms_opt(23, 59, 59)?
    } else {
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?
    };
    Some(resolve_local(naive, zone).with_timezone(&Utc))
}

/// An override waiting for its instance.
#[derive(Debug)]
struct PendingOverride {
    uid: String,
    recurrence_id: Timestamp,
    component: CalendarComponent,
    used: bool,
}

/// The resolved start and end of a component.
#[derive(Debug, Clone, Copy)]
struct EventSpan {
    /// Start, in the display zone.
    start: Timestamp,
    /// End, in the display zone. Never before `start`.
    end: Timestamp,
    /// The zone `DTSTART` was written in.
    zone: Tz,
}

impl EventSpan {
    /// Resolves `DTSTART` and the end of a component.
    ///
    /// A missing `DTEND` falls back to `DURATION`, then to one day for
    /// date-only starts, then to the start itself.
    fn resolve(component: &CalendarComponent, display: &Tz) -> Option<Self> {
        let start: IcalTime = parse_ical_time(component.property("DTSTART")?, display)?;

        let end = if let Some(end) = component
            .property("DTEND")
            .and_then(|p| parse_ical_time(p, display))
        {
            end.instant
        } else if let Some(end) = component
            .property("DURATION")
            .and_then(|p| parse_duration(p.value()))
            .and_then(|d| start.instant.checked_add_signed(d))
        {
            end
        } else if start.all_day {
            start.instant.checked_add_days(Days::new(1)).unwrap_or(start.instant)
        } else {
            start.instant
        };

        let start_at = start.instant.with_timezone(display);
        Some(Self {
            start: start_at,
            end: end.with_timezone(display).max(start_at),
            zone: start.zone,
        })
    }

    fn length(&self) -> Duration {
        self.end - self.start
    }
}
