//! Org document assembly.
//!
//! A document is a header block followed by one heading per event, in the
//! order the events are given. Optional event fields that are absent or
//! empty suppress their whole property line.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{AttendeeRecord, NormalizedEvent};
use crate::format::{TimestampKind, format_duration, format_range, format_timestamp};
use crate::links::render_link;

/// Column width of the property drawer keys, colons included.
const PROPERTY_KEY_WIDTH: usize = 15;

/// Title used when none is configured.
pub const DEFAULT_TITLE: &str = "Calendar";

/// The `#+KEY:` lines at the top of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderFields {
    pub title: String,
    pub author: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub startup: Option<String>,
    pub filetags: Option<String>,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: None,
            email: None,
            description: None,
            category: None,
            startup: None,
            filetags: None,
        }
    }
}

impl HeaderFields {
    /// Creates header fields with the given title and everything else unset.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    fn lines(&self) -> [(&'static str, &str); 7] {
        [
            ("TITLE", self.title.as_str()),
            ("AUTHOR", self.author.as_deref().unwrap_or_default()),
            ("EMAIL", self.email.as_deref().unwrap_or_default()),
            ("DESCRIPTION", self.description.as_deref().unwrap_or_default()),
            ("CATEGORY", self.category.as_deref().unwrap_or_default()),
            ("STARTUP", self.startup.as_deref().unwrap_or_default()),
            ("FILETAGS", self.filetags.as_deref().unwrap_or_default()),
        ]
    }
}

/// Renders normalized events into an org document.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    header: HeaderFields,
}

impl DocumentAssembler {
    /// Creates an assembler for the given header.
    pub fn new(header: HeaderFields) -> Self {
        Self { header }
    }

    /// Assembles the whole document in memory.
    pub fn assemble(&self, events: &[NormalizedEvent]) -> String {
        let mut out = self.render_header();
        for event in events {
            out.push_str(&self.render_event(event));
        }
        out
    }

    /// Streams the document to `sink`, one block at a time.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink; nothing after it is written.
    pub fn write_to<W: io::Write>(&self, events: &[NormalizedEvent], sink: &mut W) -> io::Result<()> {
        sink.write_all(self.render_header().as_bytes())?;
        for event in events {
            sink.write_all(self.render_event(event).as_bytes())?;
        }
        sink.flush()
    }

    /// Renders the header block, terminated by a blank line.
    pub fn render_header(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.header.lines() {
            if value.is_empty() {
                out.push_str(&format!("#+{}:\n", key));
            } else {
                out.push_str(&format!("#+{}: {}\n", key, value));
            }
        }
        out.push('\n');
        out
    }

    /// Renders a single event heading with its property drawer.
    pub fn render_event(&self, event: &NormalizedEvent) -> String {
        debug!(uid = %event.uid, summary = %event.summary, "Rendering event");

        let mut out = format!("* {}\n:PROPERTIES:\n", event.summary);
        push_property(&mut out, "ICAL_EVENT", "t");
        push_property(&mut out, "ID", &event.uid);

        if let Some(organizer) = event.organizer.as_deref().filter(|o| !o.is_empty()) {
            push_property(&mut out, "ORGANIZER", &render_link(organizer));
        }
        if !event.status.is_empty() {
            push_property(&mut out, "STATUS", &event.status);
        }
        if let Some(ref modified) = event.last_modified {
            push_property(
                &mut out,
                "LAST_MODIFIED",
                &format_timestamp(Some(modified), TimestampKind::Inactive),
            );
        }
        if !event.location.is_empty() {
            push_property(&mut out, "LOCATION", &event.location);
        }
        if let Some(ref duration) = event.duration {
            push_property(&mut out, "DURATION", &format_duration(duration));
        }
        if !event.attendees.is_empty() {
            push_property(&mut out, "ATTENDEES", &render_attendees(&event.attendees));
        }

        out.push_str(":END:\n");
        out.push_str(&format_range(&event.start_date, &event.end_date));
        out.push_str("\n\n");

        if !event.description.is_empty() {
            out.push_str(&event.description);
            out.push('\n');
        }
        out
    }
}

fn push_property(out: &mut String, key: &str, value: &str) {
    let key = format!(":{}:", key);
    out.push_str(&format!("{:<width$} {}\n", key, value, width = PROPERTY_KEY_WIDTH));
}

/// The common name, or the address when the attendee has none.
fn attendee_label(attendee: &AttendeeRecord) -> &str {
    attendee
        .common_name
        .as_deref()
        .filter(|cn| !cn.is_empty())
        .or(attendee.address.as_deref())
        .unwrap_or_default()
}

fn render_attendees(attendees: &[AttendeeRecord]) -> String {
    attendees
        .iter()
        .map(|a| {
            format!(
                "{} ({})",
                render_link(attendee_label(a)),
                a.status.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDuration;
    use crate::time::Timestamp;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Tz::UTC.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn minimal_event() -> NormalizedEvent {
        NormalizedEvent::new("evt-1", at(2021, 8, 5, 12, 30), at(2021, 8, 5, 13, 20))
            .with_summary("Standup")
    }

    #[test]
    fn header_defaults_to_calendar_title() {
        let header = DocumentAssembler::default().render_header();
        assert_eq!(
            header,
            "#+TITLE: Calendar\n#+AUTHOR:\n#+EMAIL:\n#+DESCRIPTION:\n#+CATEGORY:\n#+STARTUP:\n#+FILETAGS:\n\n"
        );
    }

    #[test]
    fn header_renders_configured_values() {
        let header = HeaderFields {
            author: Some("Fred Flintstone".to_string()),
            filetags: Some(":cal:".to_string()),
            ..HeaderFields::titled("Work")
        };
        let out = DocumentAssembler::new(header).render_header();
        assert!(out.starts_with("#+TITLE: Work\n#+AUTHOR: Fred Flintstone\n"));
        assert!(out.contains("#+FILETAGS: :cal:\n"));
    }

    #[test]
    fn minimal_event_omits_optional_lines() {
        let out = DocumentAssembler::default().render_event(&minimal_event());
        assert_eq!(
            out,
            "* Standup\n\
             :PROPERTIES:\n\
             :ICAL_EVENT:    t\n\
             :ID:            evt-1\n\
             :DURATION:      00:50 hh:mm\n\
             :END:\n\
             <2021-08-05 Thu 12:30-13:20>\n\
             \n"
        );
        assert!(!out.contains(":STATUS:"));
        assert!(!out.contains(":ORGANIZER:"));
        assert!(!out.contains(":ATTENDEES:"));
    }

    #[test]
    fn instantaneous_event_has_no_duration_line() {
        let t = at(2021, 8, 5, 9, 0);
        let event = NormalizedEvent::new("evt-2", t, t);
        let out = DocumentAssembler::default().render_event(&event);
        assert!(!out.contains(":DURATION:"));
        assert!(out.starts_with("* \n"));
    }

    #[test]
    fn property_keys_are_aligned() {
        let event = minimal_event()
            .with_status("CONFIRMED")
            .with_location("Conference Room A")
            .with_organizer("mailto:fred@bedrock.com")
            .with_last_modified(at(2021, 8, 1, 8, 0));
        let out = DocumentAssembler::default().render_event(&event);

        assert!(out.contains(":ORGANIZER:     [[mailto:fred@bedrock.com][fred@bedrock.com]]\n"));
        assert!(out.contains(":STATUS:        CONFIRMED\n"));
        assert!(out.contains(":LAST_MODIFIED: [2021-08-01 Sun 08:00]\n"));
        assert!(out.contains(":LOCATION:      Conference Room A\n"));
    }

    #[test]
    fn attendees_render_link_and_status() {
        let event = minimal_event()
            .with_attendee(AttendeeRecord {
                common_name: Some("barney@bedrock.com".to_string()),
                status: Some("ACCEPTED".to_string()),
                ..Default::default()
            })
            .with_attendee(AttendeeRecord {
                common_name: Some("Wilma".to_string()),
                status: Some("NEEDS-ACTION".to_string()),
                ..Default::default()
            });
        let out = DocumentAssembler::default().render_event(&event);
        assert!(out.contains(
            ":ATTENDEES:     [[mailto:barney@bedrock.com][barney@bedrock.com]] (ACCEPTED), Wilma (NEEDS-ACTION)\n"
        ));
    }

    #[test]
    fn attendee_without_name_uses_address() {
        let event = minimal_event().with_attendee(AttendeeRecord {
            address: Some("mailto:dino@bedrock.com".to_string()),
            status: Some("ACCEPTED".to_string()),
            ..Default::default()
        });
        let out = DocumentAssembler::default().render_event(&event);
        assert!(out.contains(":ATTENDEES:     [[mailto:dino@bedrock.com][dino@bedrock.com]] (ACCEPTED)\n"));
    }

    #[test]
    fn attendee_name_wins_over_address() {
        let event = minimal_event().with_attendee(AttendeeRecord {
            common_name: Some("Wilma".to_string()),
            address: Some("mailto:wilma@bedrock.com".to_string()),
            status: Some("ACCEPTED".to_string()),
            ..Default::default()
        });
        let out = DocumentAssembler::default().render_event(&event);
        assert!(out.contains(":ATTENDEES:     Wilma (ACCEPTED)\n"));
    }

    #[test]
    fn description_follows_blank_line() {
        let event = minimal_event().with_description("Agenda:\n- coffee");
        let out = DocumentAssembler::default().render_event(&event);
        assert!(out.ends_with("<2021-08-05 Thu 12:30-13:20>\n\nAgenda:\n- coffee\n"));
    }

    #[test]
    fn explicit_duration_wins_over_computed() {
        let event = minimal_event().with_duration(Some(EventDuration {
            weeks: Some(1),
            days: Some(2),
            hours: 3,
            minutes: 4,
        }));
        let out = DocumentAssembler::default().render_event(&event);
        assert!(out.contains(":DURATION:      1 wk 2 d 03:03 hh:mm\n"));
    }

    #[test]
    fn streaming_matches_in_memory_assembly() {
        let events = vec![minimal_event(), minimal_event().with_summary("Retro")];
        let assembler = DocumentAssembler::new(HeaderFields::titled("Team"));

        let mut sink = Vec::new();
        assembler.write_to(&events, &mut sink).unwrap();

        assert_eq!(String::from_utf8(sink).unwrap(), assembler.assemble(&events));
    }

    #[test]
    fn sink_errors_are_returned() {
        struct FailingSink;

        impl io::Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = DocumentAssembler::default().write_to(&[minimal_event()], &mut FailingSink);
        assert_eq!(result.unwrap_err().to_string(), "disk full");
    }
}
