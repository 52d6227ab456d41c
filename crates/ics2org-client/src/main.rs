//! ics2org CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

use ics2org_client::cli::{Cli, Command, ConfigAction};
use ics2org_client::config::ClientConfig;
use ics2org_client::error::ClientResult;
use ics2org_client::{commands, pipeline};
use ics2org_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                let cause_text = cause.to_string();
                if !message.contains(&cause_text) {
                    message.push_str(": ");
                    message.push_str(&cause_text);
                }
                source = cause.source();
            }
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };
    debug!(path = %config_path.display(), "Loaded configuration");

    // The only clock read in the program.
    let today = chrono::Utc::now()
        .with_timezone(&resolve_zone(&cli, &config))
        .date_naive();

    match cli.command {
        Some(Command::Config { ref action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config, &cli, today),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        None => {
            let resolved = config.resolve(&cli, today)?;
            let count = pipeline::run(&resolved).await?;
            info!(entries = count, "Export finished");
            Ok(())
        }
    }
}

/// Zone used to decide what "today" is. Invalid names are reported by
/// `ClientConfig::resolve`, so this falls back to UTC.
fn resolve_zone(cli: &Cli, config: &ClientConfig) -> chrono_tz::Tz {
    cli.timezone
        .as_deref()
        .unwrap_or(&config.window.timezone)
        .parse()
        .unwrap_or(chrono_tz::Tz::UTC)
}
