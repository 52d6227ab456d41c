//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ics2org_core::OutputFormat;

/// ics2org - Export an iCalendar feed to an org-mode agenda file
#[derive(Debug, Default, Parser)]
#[command(name = "ics2org")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ICS2ORG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Source flags ---
    /// Read the calendar from a local .ics file
    #[arg(long, short, group = "source")]
    pub input: Option<PathBuf>,

    /// Download the calendar from an http(s):// or webcal:// URL
    #[arg(long, group = "source")]
    pub url: Option<String>,

    // --- Window flags ---
    /// Day the export window opens, at 00:00 (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the export window, included in full (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// IANA time zone used for floating times and rendering (e.g. Europe/Paris)
    #[arg(long, env = "ICS2ORG_TIMEZONE")]
    pub timezone: Option<String>,

    /// Sort entries by start time instead of masters first
    #[arg(long)]
    pub chronological: bool,

    // --- Output flags ---
    /// Write the document to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output format: org or json
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    // --- Identity flags ---
    /// Your name as it appears in attendee lists
    #[arg(long, env = "ICS2ORG_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Your email as it appears in attendee lists
    #[arg(long, env = "ICS2ORG_AUTHOR_EMAIL")]
    pub author_email: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
