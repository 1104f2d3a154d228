//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Diagnostics always go to stderr so stdout carries only the report.
//!
//! # Log Levels
//!
//! - `warn` (default): compiler warnings, trial identity notice, retries
//! - `info`: stage progress and analysis status transitions
//! - `debug` (`--debug`): stage detail such as resolved imports and selected contract

use std::io::{self, IsTerminal};

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::{
  fmt::{self, MakeWriter},
  layer::SubscriberExt,
  util::SubscriberInitExt,
  EnvFilter,
};

#[derive(Debug, Clone)]
pub struct LogConfig {
  pub level: Level,
  pub with_target: bool,
  pub with_ansi: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: Level::WARN,
      with_target: false,
      with_ansi: io::stderr().is_terminal(),
    }
  }
}

impl LogConfig {
  /// `debug` raises the level and shows module targets.
  #[must_use]
  pub fn for_cli(debug: bool) -> Self {
    if debug {
      Self {
        level: Level::DEBUG,
        with_target: true,
        ..Self::default()
      }
    } else {
      Self::default()
    }
  }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
  init_logging_with_writer(config, io::stderr)
}

pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> anyhow::Result<()>
where
  W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
  let layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(config.with_ansi)
    .with_target(config.with_target)
    .without_time();

  tracing_subscriber::registry()
    .with(build_env_filter(config.level))
    .with(layer)
    .try_init()
    .context("failed to install tracing subscriber")
}

/// `RUST_LOG` wins over the configured level.
fn build_env_filter(level: Level) -> EnvFilter {
  let level = level.as_str().to_lowercase();
  EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(format!(
      "warn,sabre_rs={level},compiler={level},analysis={level}"
    ))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_flag_raises_level() {
    assert_eq!(LogConfig::for_cli(false).level, Level::WARN);
    let debug = LogConfig::for_cli(true);
    assert_eq!(debug.level, Level::DEBUG);
    assert!(debug.with_target);
  }
}
