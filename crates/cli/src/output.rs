//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, profile lists with a selection marker, and the sink that shows
//! engine messages to the user.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use envswitch_lib::engine::ProfileOption;
use envswitch_lib::log::LogSink;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ColorChoice {
  #[default]
  Auto,
  Always,
  Never,
}

impl ColorChoice {
  /// Apply the choice process-wide. `Auto` leaves detection to owo-colors.
  pub fn apply(self) {
    match self {
      ColorChoice::Auto => owo_colors::unset_override(),
      ColorChoice::Always => owo_colors::set_override(true),
      ColorChoice::Never => owo_colors::set_override(false),
    }
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const SELECTED: &str = "⏵";
}

/// One profile line: the marker for the selection, blank padding otherwise.
pub fn format_option(option: &ProfileOption) -> String {
  if option.selected {
    format!("{} {}", symbols::SELECTED, option.name)
  } else {
    format!("  {}", option.name)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Print a scope heading followed by its profiles.
pub fn print_options(scope: &str, options: &[ProfileOption]) {
  println!("{}", scope.if_supports_color(Stream::Stdout, |s| s.bold()));
  for option in options {
    let line = format_option(option);
    if option.selected {
      println!("  {}", line.if_supports_color(Stream::Stdout, |s| s.green()));
    } else {
      println!("  {}", line);
    }
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Shows engine messages on stderr so stdout stays clean for `--json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
  fn write_line(&self, line: &str) {
    eprintln!(
      "{} {}",
      symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.cyan()),
      line
    );
  }
}
