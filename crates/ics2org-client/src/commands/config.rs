//! Configuration commands.

use std::path::Path;

use chrono::NaiveDate;

use crate::cli::Cli;
use crate::config::{CalendarLocation, ClientConfig};
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration by resolving it as an export run would.
///
/// Secret references are looked up, so a broken `pass::` or `env::`
/// reference fails validation.
pub fn validate(config: &ClientConfig, cli: &Cli, today: NaiveDate) -> ClientResult<()> {
    let resolved = config.resolve(cli, today)?;

    match resolved.source {
        CalendarLocation::File(ref path) => println!("source: file {}", path.display()),
        CalendarLocation::Url(_) => println!("source: url (resolved)"),
    }
    println!(
        "window: {} .. {} ({})",
        resolved.window.start.format("%Y-%m-%d %H:%M"),
        resolved.window.end.format("%Y-%m-%d %H:%M"),
        resolved.timezone()
    );
    match resolved.output {
        Some(ref path) => println!("output: {} ({})", path.display(), resolved.format),
        None => println!("output: stdout ({})", resolved.format),
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 8, 5).unwrap()
    }

    #[test]
    fn validate_accepts_a_resolvable_config() {
        let cli = Cli {
            input: Some(PathBuf::from("work.ics")),
            ..Default::default()
        };
        assert!(validate(&ClientConfig::default(), &cli, today()).is_ok());
    }

    #[test]
    fn validate_rejects_a_missing_source() {
        let err = validate(&ClientConfig::default(), &Cli::default(), today()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn validate_rejects_an_unresolvable_secret() {
        let mut config = ClientConfig::default();
        config.source.url = Some("env::_ICS2ORG_TEST_UNSET_URL".to_string());
        assert!(validate(&config, &Cli::default(), today()).is_err());
    }

    #[test]
    fn dump_serializes_defaults() {
        assert!(dump(&ClientConfig::default(), Path::new("config.toml")).is_ok());
    }
}
