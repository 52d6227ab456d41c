//! Attendee normalization.
//!
//! Turns a raw `ATTENDEE` property into an [`AttendeeRecord`] and decides
//! whether the attendee is the configured author.

use ics2org_core::AttendeeRecord;
use serde::{Deserialize, Serialize};

use crate::component::{Property, unescape_text};

/// Who "me" is when flagging attendees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The author's display name, e.g. `Fred Flintstone`.
    pub author_name: Option<String>,
    /// The author's email address, e.g. `fred@bedrock.com`.
    pub author_email: Option<String>,
}

impl Identity {
    /// Creates an identity from a name and an email.
    pub fn new(author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            author_name: Some(author_name.into()),
            author_email: Some(author_email.into()),
        }
    }

    /// Returns true if `common_name` is exactly the author name or email.
    ///
    /// Comparison is case-sensitive with no normalization; an unset identity
    /// string never matches.
    pub fn matches(&self, common_name: &str) -> bool {
        self.author_name.as_deref() == Some(common_name)
            || self.author_email.as_deref() == Some(common_name)
    }
}

/// Builds an attendee record from an `ATTENDEE` property.
///
/// Missing parameters stay `None`. Never fails.
pub fn normalize_attendee(attendee: &Property, identity: &Identity) -> AttendeeRecord {
    let param = |key: &str| attendee.param(key).map(unescape_text);
    let common_name = param("CN");

    AttendeeRecord {
        category: param("CUTYPE"),
        role: param("ROLE"),
        status: param("PARTSTAT"),
        is_me: common_name.as_deref().is_some_and(|cn| identity.matches(cn)),
        common_name,
        guest_count: param("X-NUM-GUESTS"),
        address: Some(attendee.value().trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fred() -> Identity {
        Identity::new("Fred Flintstone", "fred@bedrock.com")
    }

    fn attendee(cn: &str) -> Property {
        Property::new("ATTENDEE", "mailto:fred@bedrock.com")
            .with_param("CUTYPE", "INDIVIDUAL")
            .with_param("ROLE", "REQ-PARTICIPANT")
            .with_param("PARTSTAT", "ACCEPTED")
            .with_param("CN", cn)
            .with_param("X-NUM-GUESTS", "0")
    }

    #[test]
    fn copies_all_parameters() {
        let record = normalize_attendee(&attendee("Fred Flintstone"), &fred());

        assert_eq!(record.category.as_deref(), Some("INDIVIDUAL"));
        assert_eq!(record.role.as_deref(), Some("REQ-PARTICIPANT"));
        assert_eq!(record.status.as_deref(), Some("ACCEPTED"));
        assert_eq!(record.common_name.as_deref(), Some("Fred Flintstone"));
        assert_eq!(record.guest_count.as_deref(), Some("0"));
        assert_eq!(record.address.as_deref(), Some("mailto:fred@bedrock.com"));
    }

    #[test]
    fn matches_author_name_exactly() {
        assert!(normalize_attendee(&attendee("Fred Flintstone"), &fred()).is_me);
    }

    #[test]
    fn matches_author_email() {
        assert!(normalize_attendee(&attendee("fred@bedrock.com"), &fred()).is_me);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!normalize_attendee(&attendee("fred flintstone"), &fred()).is_me);
        assert!(!normalize_attendee(&attendee("FLINTSTONE, Fred"), &fred()).is_me);
    }

    #[test]
    fn missing_parameters_are_none() {
        let bare = Property::new("ATTENDEE", "mailto:nobody@bedrock.com");
        let record = normalize_attendee(&bare, &fred());

        assert_eq!(
            record,
            AttendeeRecord {
                address: Some("mailto:nobody@bedrock.com".to_string()),
                ..Default::default()
            }
        );
        assert!(!record.is_me);
    }

    #[test]
    fn unset_identity_never_matches() {
        let record = normalize_attendee(&attendee(""), &Identity::default());
        assert!(!record.is_me);
    }
}
