//! Opaque calendar components and typed property extraction.
//!
//! A [`CalendarComponent`] is an ordered list of [`Property`] lines, exactly
//! as they appeared in the source. [`extract`] pulls the first property of a
//! given name out of a component and converts it according to its kind.

use chrono_tz::Tz;
use ics2org_core::Timestamp;
use tracing::warn;

use crate::ics::parse_ical_time;

/// A single content line of a component: `NAME;PARAM=VALUE:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    value: String,
    params: Vec<(String, String)>,
}

impl Property {
    /// Creates a property with no parameters. The name is upper-cased.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            value: value.into(),
            params: Vec::new(),
        }
    }

    /// Builder method to add a parameter. The key is upper-cased.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .push((key.into().to_ascii_uppercase(), value.into()));
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw property value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the first parameter with the given key (case-insensitive).
    ///
    /// Surrounding double quotes are removed.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim_matches('"'))
    }

    /// Returns the declared kind of this property.
    ///
    /// An explicit `VALUE=` parameter wins; otherwise the RFC 5545 default
    /// type of the property name is used.
    pub fn kind(&self) -> PropertyKind {
        if let Some(value_type) = self.param("VALUE") {
            return match value_type.to_ascii_uppercase().as_str() {
                "DATE" | "DATE-TIME" => PropertyKind::DateTime,
                "TEXT" => PropertyKind::Text,
                _ => PropertyKind::Other,
            };
        }
        PropertyKind::default_for(&self.name)
    }
}

/// How a property's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Free text; escapes are decoded.
    Text,
    /// A date or date-time, resolved to a concrete instant.
    DateTime,
    /// Anything else (addresses, URIs, recurrence rules, durations).
    Other,
}

impl PropertyKind {
    fn default_for(name: &str) -> Self {
        match name {
            "SUMMARY" | "DESCRIPTION" | "LOCATION" | "COMMENT" | "CATEGORIES" | "STATUS"
            | "UID" | "CONTACT" | "RESOURCES" | "CLASS" | "TRANSP" | "RELATED-TO" => Self::Text,
            "DTSTART" | "DTEND" | "DTSTAMP" | "LAST-MODIFIED" | "CREATED" | "RECURRENCE-ID"
            | "DUE" | "COMPLETED" | "EXDATE" | "RDATE" => Self::DateTime,
            _ => Self::Other,
        }
    }
}

/// One `VEVENT` from a calendar, kept as raw properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarComponent {
    properties: Vec<Property>,
}

impl CalendarComponent {
    /// Creates an empty component.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to append a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Appends a property.
    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Returns the first property with the given name (case-insensitive).
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns every property with the given name, in source order.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if the component has a property with the given name.
    pub fn has(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Returns the raw UID, or an empty string.
    pub fn uid(&self) -> &str {
        self.property("UID").map(Property::value).unwrap_or_default()
    }

    /// Returns true if this component overrides one instance of a series.
    pub fn is_override(&self) -> bool {
        self.has("RECURRENCE-ID")
    }

    /// Returns true if this component defines a recurring series.
    pub fn is_recurring(&self) -> bool {
        self.has("RRULE") || self.has("RDATE")
    }
}

/// The typed value of an extracted property.
///
/// An absent property extracts as empty text, so callers can treat
/// "absent" and "empty" the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A text value, with escapes decoded.
    Text(String),
    /// A date or date-time resolved to an instant.
    DateTime(Timestamp),
    /// Any other value, as its raw string.
    Other(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl FieldValue {
    /// Returns true for empty text or empty raw values.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) | Self::Other(s) => s.is_empty(),
            Self::DateTime(_) => false,
        }
    }

    /// Returns the value as a string.
    ///
    /// Instants render as RFC 3339.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) | Self::Other(s) => s,
            Self::DateTime(dt) => dt.to_rfc3339(),
        }
    }

    /// Returns the value as a string, or `None` when empty.
    pub fn into_non_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.into_text())
        }
    }

    /// Returns the instant, if this is a date-time value.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Extracts the first property named `name` from `component`.
///
/// - absent property: empty text
/// - text property: the decoded string
/// - date-time property: the instant, converted to `tz`
/// - anything else: the raw string
///
/// Date-time values that cannot be parsed fall back to their raw string.
pub fn extract(name: &str, component: &CalendarComponent, tz: &Tz) -> FieldValue {
    let Some(property) = component.property(name) else {
        return FieldValue::default();
    };

    match property.kind() {
        PropertyKind::Text => FieldValue::Text(unescape_text(property.value())),
        PropertyKind::DateTime => match parse_ical_time(property, tz) {
            Some(time) => FieldValue::DateTime(time.instant.with_timezone(tz)),
            None => {
                warn!(
                    property = name,
                    value = property.value(),
                    "Unparseable date-time, keeping raw value"
                );
                FieldValue::Other(property.value().to_string())
            }
        },
        PropertyKind::Other => FieldValue::Other(property.value().to_string()),
    }
}

/// Decodes RFC 5545 text escapes (`\n`, `\,`, `\;`, `\\`).
pub fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting() -> CalendarComponent {
        CalendarComponent::new()
            .with_property(Property::new("UID", "evt-1@bedrock.com"))
            .with_property(Property::new("SUMMARY", "Quarry\\, north pit"))
            .with_property(Property::new("DTSTART", "20210805T123000Z"))
            .with_property(
                Property::new("DTEND", "20210805T142000").with_param("TZID", "Europe/Paris"),
            )
            .with_property(Property::new("ORGANIZER", "mailto:slate@bedrock.com"))
            .with_property(Property::new("X-WEIRD-DATE", "not a date").with_param("VALUE", "DATE-TIME"))
            .with_property(Property::new("SUMMARY", "second summary"))
    }

    #[test]
    fn absent_property_is_empty_text() {
        let value = extract("LOCATION", &meeting(), &Tz::UTC);
        assert_eq!(value, FieldValue::Text(String::new()));
        assert!(value.is_empty());
        assert_eq!(value.into_non_empty(), None);
    }

    #[test]
    fn text_property_is_unescaped() {
        assert_eq!(
            extract("SUMMARY", &meeting(), &Tz::UTC),
            FieldValue::Text("Quarry, north pit".to_string())
        );
    }

    #[test]
    fn first_property_wins() {
        let value = extract("summary", &meeting(), &Tz::UTC).into_text();
        assert_eq!(value, "Quarry, north pit");
    }

    #[test]
    fn date_time_property_is_an_instant() {
        let value = extract("DTSTART", &meeting(), &Tz::UTC);
        assert_eq!(
            value.as_timestamp(),
            Some(Tz::UTC.with_ymd_and_hms(2021, 8, 5, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn date_time_honours_tzid_and_display_zone() {
        let value = extract("DTEND", &meeting(), &Tz::UTC);
        // 14:20 in Paris (CEST) is 12:20 UTC.
        assert_eq!(
            value.as_timestamp(),
            Some(Tz::UTC.with_ymd_and_hms(2021, 8, 5, 12, 20, 0).unwrap())
        );
    }

    #[test]
    fn other_kinds_are_raw_strings() {
        assert_eq!(
            extract("ORGANIZER", &meeting(), &Tz::UTC),
            FieldValue::Other("mailto:slate@bedrock.com".to_string())
        );
    }

    #[test]
    fn unparseable_date_time_keeps_raw_value() {
        assert_eq!(
            extract("X-WEIRD-DATE", &meeting(), &Tz::UTC),
            FieldValue::Other("not a date".to_string())
        );
    }

    #[test]
    fn property_kind_from_value_param() {
        let date = Property::new("X-DAY", "20210806").with_param("VALUE", "DATE");
        assert_eq!(date.kind(), PropertyKind::DateTime);
        assert_eq!(Property::new("URL", "https://x").kind(), PropertyKind::Other);
        assert_eq!(Property::new("status", "CONFIRMED").kind(), PropertyKind::Text);
    }

    #[test]
    fn params_are_case_insensitive_and_unquoted() {
        let p = Property::new("ATTENDEE", "mailto:a@b.c").with_param("cn", "\"Fred, F\"");
        assert_eq!(p.param("CN"), Some("Fred, F"));
        assert_eq!(p.param("ROLE"), None);
    }

    #[test]
    fn unescape_handles_all_sequences() {
        assert_eq!(unescape_text("a\\nb\\;c\\\\d\\,e"), "a\nb;c\\d,e");
        assert_eq!(unescape_text("trailing\\"), "trailing\\");
        assert_eq!(unescape_text("keep\\x"), "keep\\x");
    }

    #[test]
    fn recurrence_flags() {
        let series = meeting().with_property(Property::new("RRULE", "FREQ=DAILY"));
        assert!(series.is_recurring());
        assert!(!series.is_override());
        assert_eq!(series.uid(), "evt-1@bedrock.com");
    }
}
