//! Calendar acquisition, recurrence expansion and event normalization.
//!
//! This crate turns raw iCalendar text into the ordered stream of
//! [`NormalizedEvent`]s the document assembler renders:
//!
//! - [`CalendarSource`] - Acquires raw calendar text (file, HTTP)
//! - [`CalendarExpander`] - Splits a calendar into master events and occurrence instances
//! - [`extract`] - Typed access to a single property of a [`CalendarComponent`]
//! - [`EventNormalizer`] - Builds normalized records and merges them for a window
//! - [`ProviderError`] - Error types for acquisition and expansion
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │   FileSource    │    │   HttpSource    │
//! └────────┬────────┘    └────────┬────────┘
//!          │    CalendarSource    │
//!          └──────────┬───────────┘
//!                     │ raw text
//!                     ▼
//!              ┌─────────────┐
//!              │ IcsExpander │  (window)
//!              └──────┬──────┘
//!                     │ ExpandedCalendar { events, occurrences }
//!                     ▼
//!            ┌──────────────────┐
//!            │ EventNormalizer  │  normalize + merge
//!            └────────┬─────────┘
//!                     ▼
//!             Vec<NormalizedEvent>
//! ```
//!
//! [`NormalizedEvent`]: ics2org_core::NormalizedEvent

pub mod attendee;
pub mod component;
pub mod error;
pub mod expand;
pub mod ics;
pub mod normalize;
pub mod source;

// Re-export main types at crate root
pub use attendee::{Identity, normalize_attendee};
pub use component::{CalendarComponent, FieldValue, Property, PropertyKind, extract};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use expand::{CalendarExpander, ExpandedCalendar, IcsExpander, MasterEvent, Occurrence};
pub use normalize::{EventNormalizer, MergeOrder, merge_window};
pub use source::{BoxFuture, CalendarSource, FileSource};

#[cfg(feature = "http")]
pub use source::HttpSource;
