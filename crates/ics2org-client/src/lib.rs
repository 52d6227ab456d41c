//! CLI, configuration and output sink
//!
//! This crate provides the `ics2org` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod secret;
pub mod sink;

pub use cli::Cli;
pub use config::{ClientConfig, ResolvedConfig};
pub use error::{ClientError, ClientResult};
pub use sink::OutputSink;
