//! Org link rendering for organizer and attendee addresses.
//!
//! # Example
//!
//! ```
//! use ics2org_core::links::render_link;
//!
//! assert_eq!(
//!     render_link("mailto:fred@bedrock.com"),
//!     "[[mailto:fred@bedrock.com][fred@bedrock.com]]"
//! );
//! assert_eq!(render_link("Conference Room A"), "Conference Room A");
//! ```

const MAILTO_PREFIX: &str = "mailto:";

/// Renders a calendar address as an org link.
///
/// - `mailto:X` becomes `[[mailto:X][X]]`
/// - a bare address containing `@` becomes `[[mailto:X][X]]`
/// - anything else (plain names, opaque identifiers, empty text) is returned unchanged
pub fn render_link(raw: &str) -> String {
    if let Some(address) = raw.strip_prefix(MAILTO_PREFIX) {
        format!("[[{}][{}]]", raw, address)
    } else if raw.contains('@') {
        format!("[[{}{}][{}]]", MAILTO_PREFIX, raw, raw)
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailto_prefix_is_stripped_from_label() {
        assert_eq!(
            render_link("mailto:fred@bedrock.com"),
            "[[mailto:fred@bedrock.com][fred@bedrock.com]]"
        );
    }

    #[test]
    fn bare_address_gets_mailto_target() {
        assert_eq!(
            render_link("fred@bedrock.com"),
            "[[mailto:fred@bedrock.com][fred@bedrock.com]]"
        );
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(render_link("Conference Room A"), "Conference Room A");
        assert_eq!(render_link(""), "");
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        // Only the exact lowercase prefix is stripped; the `@` rule still applies.
        assert_eq!(
            render_link("MAILTO:fred@bedrock.com"),
            "[[mailto:MAILTO:fred@bedrock.com][MAILTO:fred@bedrock.com]]"
        );
    }

    #[test]
    fn mailto_without_at_sign_is_still_a_link() {
        assert_eq!(render_link("mailto:fred"), "[[mailto:fred][fred]]");
    }
}
