//! Client error types.

use std::io;

use ics2org_providers::ProviderError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching or expanding the calendar failed.
    #[error("calendar error: {0}")]
    Source(#[from] ProviderError),

    /// Writing the rendered output failed.
    #[error("output error while trying to {stage}: {source}")]
    Sink {
        /// The step that failed, e.g. `write output`.
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    /// A command-line value could not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Wraps a sink failure with the stage it happened in.
    pub fn sink(stage: &'static str, source: io::Error) -> Self {
        Self::Sink { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_names_the_stage() {
        let err = ClientError::sink("persist output", io::Error::other("disk full"));
        assert_eq!(
            err.to_string(),
            "output error while trying to persist output: disk full"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn provider_errors_convert() {
        let err: ClientError = ProviderError::invalid_calendar("no VCALENDAR").into();
        assert!(matches!(err, ClientError::Source(_)));
        assert!(err.to_string().contains("invalid_calendar"));
    }
}
