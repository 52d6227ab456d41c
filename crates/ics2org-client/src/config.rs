//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/ics2org/config.toml` by default. Command-line flags override
//! file values; the merged result is a [`ResolvedConfig`] that is passed
//! explicitly to every pipeline stage.
//!
//! `source.url`, `identity.author_name` and `identity.author_email` support
//! secret references:
//! - `pass::path/in/store` - resolved via `pass show`
//! - `env::VAR_NAME` - resolved from the environment
//! - plain text - used as-is

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use ics2org_core::{HeaderFields, OutputFormat, TimeWindow};
use ics2org_providers::{Identity, MergeOrder};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};
use crate::secret;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the ics2org client, as written in `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Who "me" is in attendee lists.
    pub identity: Identity,

    /// Document header lines.
    pub header: HeaderFields,

    /// Where the calendar comes from.
    pub source: SourceSettings,

    /// The export window.
    pub window: WindowSettings,

    /// Where and how the document is written.
    pub output: OutputSettings,
}

/// Calendar source settings. Exactly one of `path` and `url` is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Local `.ics` file.
    pub path: Option<PathBuf>,

    /// Remote calendar URL (supports `pass::` and `env::` prefixes).
    pub url: Option<String>,

    /// Download timeout in seconds.
    pub timeout: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            timeout: 30,
        }
    }
}

/// Export window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Days before today the window opens.
    pub days_before: u32,

    /// Days after today the window closes.
    pub days_after: u32,

    /// IANA zone for floating times and rendering.
    pub timezone: String,

    /// Maximum instances generated per recurring series.
    pub max_occurrences: u16,

    /// Entry order in the document.
    pub sort: MergeOrder,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            days_before: 7,
            days_after: 30,
            timezone: "UTC".to_string(),
            max_occurrences: 1000,
            sort: MergeOrder::default(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output file; stdout when unset.
    pub path: Option<PathBuf>,

    /// Document format.
    pub format: OutputFormat,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ics2org")
    }

    /// Merges command-line overrides into this configuration.
    ///
    /// `today` anchors the default window; it is the only clock input.
    ///
    /// # Errors
    ///
    /// Fails on a missing or ambiguous source, an unknown time zone, an
    /// empty window or an unresolvable secret reference.
    pub fn resolve(&self, cli: &Cli, today: NaiveDate) -> ClientResult<ResolvedConfig> {
        let source = self.resolve_source(cli)?;

        let identity = Identity {
            author_name: secret::resolve_setting(
                "identity.author_name",
                cli.author_name.as_deref().or(self.identity.author_name.as_deref()),
            )
            .map_err(ClientError::Config)?,
            author_email: secret::resolve_setting(
                "identity.author_email",
                cli.author_email.as_deref().or(self.identity.author_email.as_deref()),
            )
            .map_err(ClientError::Config)?,
        };

        let mut header = self.header.clone();
        if let Some(ref title) = cli.title {
            header.title = title.clone();
        }

        let zone_name = cli.timezone.as_deref().unwrap_or(&self.window.timezone);
        let timezone = Tz::from_str(zone_name)
            .map_err(|_| ClientError::Config(format!("unknown time zone `{}`", zone_name)))?;

        let first = match cli.from {
            Some(date) => date,
            None => today
                .checked_sub_days(Days::new(u64::from(self.window.days_before)))
                .ok_or_else(|| ClientError::Config("window.days_before is too large".to_string()))?,
        };
        let last = match cli.to {
            Some(date) => date,
            None => today
                .checked_add_days(Days::new(u64::from(self.window.days_after)))
                .ok_or_else(|| ClientError::Config("window.days_after is too large".to_string()))?,
        };
        let window = TimeWindow::for_dates(first, last, &timezone).ok_or_else(|| {
            ClientError::InvalidArgument(format!("window start {} is after window end {}", first, last))
        })?;

        if self.window.max_occurrences == 0 {
            return Err(ClientError::Config(
                "window.max_occurrences must be at least 1".to_string(),
            ));
        }
        if self.source.timeout == 0 {
            return Err(ClientError::Config(
                "source.timeout must be at least 1 second".to_string(),
            ));
        }

        let order = if cli.chronological {
            MergeOrder::Chronological
        } else {
            self.window.sort
        };

        Ok(ResolvedConfig {
            identity,
            header,
            source,
            timeout: Duration::from_secs(self.source.timeout),
            window,
            max_occurrences: self.window.max_occurrences,
            order,
            output: cli.output.clone().or_else(|| self.output.path.clone()),
            format: cli.format.unwrap_or(self.output.format),
        })
    }

    fn resolve_source(&self, cli: &Cli) -> ClientResult<CalendarLocation> {
        if let Some(ref path) = cli.input {
            return Ok(CalendarLocation::File(path.clone()));
        }
        if let Some(ref url) = cli.url {
            return Ok(CalendarLocation::Url(url.clone()));
        }

        match (&self.source.path, &self.source.url) {
            (Some(_), Some(_)) => Err(ClientError::Config(
                "set either source.path or source.url, not both".to_string(),
            )),
            (Some(path), None) => Ok(CalendarLocation::File(path.clone())),
            (None, Some(url)) => secret::resolve(url)
                .map(CalendarLocation::Url)
                .map_err(|e| ClientError::Config(format!("failed to resolve source.url: {}", e))),
            (None, None) => Err(ClientError::Config(format!(
                "no calendar source. Pass --input or --url, or add to {}:\n  \
                 [source]\n  \
                 url = \"https://example.com/calendar.ics\"",
                Self::default_path().display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvedConfig
// ---------------------------------------------------------------------------

/// Where the raw calendar is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarLocation {
    /// A local file.
    File(PathBuf),
    /// A remote URL.
    Url(String),
}

/// Fully merged settings for one export run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Identity for attendee matching.
    pub identity: Identity,
    /// Header lines of the document.
    pub header: HeaderFields,
    /// Calendar location.
    pub source: CalendarLocation,
    /// Download timeout.
    pub timeout: Duration,
    /// The export window, in the display zone.
    pub window: TimeWindow,
    /// Instance cap per recurring series.
    pub max_occurrences: u16,
    /// Entry order.
    pub order: MergeOrder,
    /// Output file, or `None` for stdout.
    pub output: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
}

impl ResolvedConfig {
    /// Returns the zone timestamps are rendered in.
    pub fn timezone(&self) -> Tz {
        self.window.timezone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, 5).unwrap()
    }

    fn with_input() -> Cli {
        Cli {
            input: Some(PathBuf::from("work.ics")),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.header.title, "Calendar");
        assert_eq!(config.source.timeout, 30);
        assert_eq!(config.window.days_before, 7);
        assert_eq!(config.window.days_after, 30);
        assert_eq!(config.window.timezone, "UTC");
        assert_eq!(config.window.max_occurrences, 1000);
        assert_eq!(config.window.sort, MergeOrder::Source);
        assert_eq!(config.output.format, OutputFormat::Org);
    }

    #[test]
    fn parses_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[identity]
author_name = "Fred Flintstone"
author_email = "fred@bedrock.com"

[header]
title = "Bedrock"
filetags = ":work:"

[source]
url = "webcal://example.com/team.ics"
timeout = 10

[window]
days_before = 1
days_after = 14
timezone = "Europe/Paris"
sort = "chronological"

[output]
path = "/tmp/agenda.org"
format = "json"
"#
        )
        .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.identity.author_name.as_deref(), Some("Fred Flintstone"));
        assert_eq!(config.header.title, "Bedrock");
        assert_eq!(config.header.filetags.as_deref(), Some(":work:"));
        assert_eq!(config.header.author, None);
        assert_eq!(config.source.timeout, 10);
        assert_eq!(config.window.sort, MergeOrder::Chronological);
        assert_eq!(config.window.max_occurrences, 1000);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[window\ndays_before = ").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn default_window_surrounds_today() {
        let resolved = ClientConfig::default().resolve(&with_input(), today()).unwrap();

        assert_eq!(resolved.window.start.date_naive(), NaiveDate::from_ymd_opt(2021, 7, 29).unwrap());
        // The last day, 2021-09-04, is covered up to the following midnight.
        assert_eq!(resolved.window.end.date_naive(), NaiveDate::from_ymd_opt(2021, 9, 5).unwrap());
        assert_eq!(resolved.timezone(), Tz::UTC);
        assert_eq!(resolved.source, CalendarLocation::File(PathBuf::from("work.ics")));
        assert_eq!(resolved.output, None);
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config = ClientConfig::default();
        config.source.url = Some("https://example.com/team.ics".to_string());
        config.identity = Identity::new("Barney Rubble", "barney@bedrock.com");
        config.window.timezone = "America/New_York".to_string();

        let cli = Cli {
            url: Some("https://example.com/other.ics".to_string()),
            from: NaiveDate::from_ymd_opt(2021, 8, 1),
            to: NaiveDate::from_ymd_opt(2021, 8, 8),
            timezone: Some("Europe/Paris".to_string()),
            author_name: Some("Fred Flintstone".to_string()),
            title: Some("Quarry".to_string()),
            format: Some(OutputFormat::Json),
            chronological: true,
            ..Default::default()
        };
        let resolved = config.resolve(&cli, today()).unwrap();

        assert_eq!(
            resolved.source,
            CalendarLocation::Url("https://example.com/other.ics".to_string())
        );
        assert_eq!(resolved.identity.author_name.as_deref(), Some("Fred Flintstone"));
        assert_eq!(resolved.identity.author_email.as_deref(), Some("barney@bedrock.com"));
        assert_eq!(resolved.header.title, "Quarry");
        assert_eq!(resolved.timezone(), Tz::Europe__Paris);
        assert_eq!(resolved.window.start.date_naive(), NaiveDate::from_ymd_opt(2021, 8, 1).unwrap());
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.order, MergeOrder::Chronological);
    }

    #[test]
    fn source_url_resolves_env_reference() {
        unsafe {
            std::env::set_var("_ICS2ORG_TEST_CAL_URL", "https://example.com/private/abc.ics");
        }
        let mut config = ClientConfig::default();
        config.source.url = Some("env::_ICS2ORG_TEST_CAL_URL".to_string());

        let resolved = config.resolve(&Cli::default(), today()).unwrap();
        assert_eq!(
            resolved.source,
            CalendarLocation::Url("https://example.com/private/abc.ics".to_string())
        );
        unsafe {
            std::env::remove_var("_ICS2ORG_TEST_CAL_URL");
        }
    }

    #[test]
    fn missing_source_errors() {
        let err = ClientConfig::default().resolve(&Cli::default(), today()).unwrap_err();
        assert!(err.to_string().contains("no calendar source"));
    }

    #[test]
    fn ambiguous_source_errors() {
        let mut config = ClientConfig::default();
        config.source.path = Some(PathBuf::from("a.ics"));
        config.source.url = Some("https://example.com/b.ics".to_string());
        assert!(config.resolve(&Cli::default(), today()).is_err());
    }

    #[test]
    fn unknown_timezone_errors() {
        let cli = Cli {
            timezone: Some("Bedrock/Quarry".to_string()),
            ..with_input()
        };
        let err = ClientConfig::default().resolve(&cli, today()).unwrap_err();
        assert!(err.to_string().contains("Bedrock/Quarry"));
    }

    #[test]
    fn reversed_window_is_an_invalid_argument() {
        let cli = Cli {
            from: NaiveDate::from_ymd_opt(2021, 8, 10),
            to: NaiveDate::from_ymd_opt(2021, 8, 1),
            ..with_input()
        };
        let err = ClientConfig::default().resolve(&cli, today()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn dump_round_trips_through_toml() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.window.days_after, config.window.days_after);
        assert_eq!(parsed.header, config.header);
    }
}
