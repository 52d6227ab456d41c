//! Core types: normalized events, time windows, org formatting

pub mod event;
pub mod format;
pub mod links;
pub mod time;
pub mod tracing;

pub use event::{AttendeeRecord, EventDuration, NormalizedEvent};
pub use format::document::{DocumentAssembler, HeaderFields};
pub use format::{
    OutputFormat, TimestampKind, format_duration, format_range, format_timestamp, render_json,
};
pub use links::render_link;
pub use time::{TimeWindow, Timestamp};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
