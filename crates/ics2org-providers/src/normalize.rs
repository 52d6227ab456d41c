//! Event normalization and window merging.
//!
//! [`EventNormalizer`] turns expanded master events and occurrences into
//! [`NormalizedEvent`]s; [`merge_window`] combines the two groups into the
//! sequence the document is rendered from.

use chrono_tz::Tz;
use ics2org_core::{AttendeeRecord, NormalizedEvent, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attendee::{Identity, normalize_attendee};
use crate::component::{CalendarComponent, extract};
use crate::expand::{ExpandedCalendar, MasterEvent, Occurrence};

/// How masters and occurrences are ordered after merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeOrder {
    /// All masters, then all occurrences, each group in its own order.
    #[default]
    Source,
    /// Same as `Source`, then stably sorted by start.
    Chronological,
}

/// Combines normalized masters and occurrences into one sequence.
///
/// Masters come first, followed by occurrences; relative order within each
/// group is kept. With [`MergeOrder::Chronological`] the result is then
/// stably sorted by start date.
pub fn merge_window(
    masters: Vec<NormalizedEvent>,
    occurrences: Vec<NormalizedEvent>,
    order: MergeOrder,
) -> Vec<NormalizedEvent> {
    let mut merged = masters;
    merged.extend(occurrences);
    if order == MergeOrder::Chronological {
        merged.sort_by_key(|e| e.start_date);
    }
    merged
}

/// Builds normalized events from expanded calendar entries.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    identity: Identity,
    display_tz: Tz,
    order: MergeOrder,
}

impl EventNormalizer {
    /// Creates a normalizer for the given identity, rendering in `display_tz`.
    pub fn new(identity: Identity, display_tz: Tz) -> Self {
        Self {
            identity,
            display_tz,
            order: MergeOrder::default(),
        }
    }

    /// Builder method to set the merge order.
    pub fn with_order(mut self, order: MergeOrder) -> Self {
        self.order = order;
        self
    }

    /// Normalizes a master event.
    ///
    /// A master that carries its own `RECURRENCE-ID` keeps it.
    pub fn normalize_event(&self, event: &MasterEvent) -> NormalizedEvent {
        let recurrence_id = extract("RECURRENCE-ID", &event.component, &self.display_tz).as_timestamp();
        self.build(&event.component, event.start, event.end, recurrence_id)
    }

    /// Normalizes one occurrence.
    ///
    /// Fields come from the override component when present, else from the
    /// master. There is no per-field fallback between the two.
    pub fn normalize_occurrence(&self, occurrence: &Occurrence) -> NormalizedEvent {
        self.build(
            occurrence.component(),
            occurrence.start,
            occurrence.end,
            occurrence.recurrence_id,
        )
    }

    /// Normalizes every entry and merges them in the configured order.
    pub fn normalize_expanded(&self, expanded: &ExpandedCalendar) -> Vec<NormalizedEvent> {
        let masters = expanded.events.iter().map(|e| self.normalize_event(e)).collect();
        let occurrences = expanded
            .occurrences
            .iter()
            .map(|o| self.normalize_occurrence(o))
            .collect();
        merge_window(masters, occurrences, self.order)
    }

    fn build(
        &self,
        component: &CalendarComponent,
        start: Timestamp,
        end: Timestamp,
        recurrence_id: Option<Timestamp>,
    ) -> NormalizedEvent {
        let tz = &self.display_tz;
        let field = |name: &str| extract(name, component, tz);

        let attendees: Vec<AttendeeRecord> = component
            .properties_named("ATTENDEE")
            .map(|a| normalize_attendee(a, &self.identity))
            .collect();

        let mut event = NormalizedEvent::new(
            field("UID").into_text(),
            start.with_timezone(tz),
            end.with_timezone(tz),
        )
        .with_summary(field("SUMMARY").into_text())
        .with_description(field("DESCRIPTION").into_text())
        .with_location(field("LOCATION").into_text())
        .with_status(field("STATUS").into_text())
        .with_attendees(attendees);

        if let Some(organizer) = field("ORGANIZER").into_non_empty() {
            event = event.with_organizer(organizer);
        }
        if let Some(modified) = field("LAST-MODIFIED").as_timestamp() {
            event = event.with_last_modified(modified);
        }
        if let Some(id) = recurrence_id {
            event = event.with_recurrence_id(id.with_timezone(tz));
        }

        debug!(uid = %event.uid, start = %event.start_date, "Normalized event");
        event
    }
}
