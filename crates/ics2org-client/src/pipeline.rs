//! The export pipeline.
//!
//! fetch -> expand -> normalize and merge -> render -> sink
//!
//! Only [`fetch`] is async. Everything after it is a deterministic function
//! of the raw text and the [`ResolvedConfig`].

use std::io::{self, Write};

use ics2org_core::{DocumentAssembler, NormalizedEvent, OutputFormat};
use ics2org_providers::{CalendarExpander, CalendarSource, EventNormalizer, FileSource, IcsExpander};
use tracing::info;

use crate::config::{CalendarLocation, ResolvedConfig};
use crate::error::ClientResult;
use crate::sink::OutputSink;

/// Builds the source for a calendar location.
pub fn build_source(config: &ResolvedConfig) -> ClientResult<Box<dyn CalendarSource>> {
    match config.source {
        CalendarLocation::File(ref path) => Ok(Box::new(FileSource::new(path))),
        #[cfg(feature = "http")]
        CalendarLocation::Url(ref url) => Ok(Box::new(ics2org_providers::HttpSource::new(
            url,
            config.timeout,
        )?)),
        #[cfg(not(feature = "http"))]
        CalendarLocation::Url(_) => Err(ics2org_providers::ProviderError::configuration(
            "this build has no HTTP support; use --input with a local file",
        )
        .into()),
    }
}

/// Fetches the raw calendar text.
pub async fn fetch(config: &ResolvedConfig) -> ClientResult<String> {
    let source = build_source(config)?;
    Ok(source.fetch().await?)
}

/// Expands, normalizes and merges the calendar for the configured window.
pub fn export(raw: &str, config: &ResolvedConfig) -> ClientResult<Vec<NormalizedEvent>> {
    let expander = IcsExpander::new().with_max_occurrences(config.max_occurrences);
    let expanded = expander.expand(raw, &config.window)?;

    let normalizer = EventNormalizer::new(config.identity.clone(), config.timezone())
        .with_order(config.order);
    Ok(normalizer.normalize_expanded(&expanded))
}

/// Writes `events` to `out` in the configured format.
pub fn render_to(events: &[NormalizedEvent], config: &ResolvedConfig, out: &mut dyn Write) -> io::Result<()> {
    match config.format {
        OutputFormat::Org => {
            let mut out = out;
            DocumentAssembler::new(config.header.clone()).write_to(events, &mut out)
        }
        OutputFormat::Json => {
            let json = ics2org_core::render_json(events)?;
            writeln!(out, "{}", json)
        }
    }
}

/// Runs the whole export and returns the number of entries written.
pub async fn run(config: &ResolvedConfig) -> ClientResult<usize> {
    let raw = fetch(config).await?;
    let events = export(&raw, config)?;
    info!(entries = events.len(), format = %config.format, "Rendering document");

    OutputSink::new(config.output.clone()).write_with(|w| render_to(&events, config, w))?;
    Ok(events.len())
}
