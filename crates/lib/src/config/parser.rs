//! Parser for the `[env:...]` config format.
//!
//! ```text
//! # shared profiles apply to every target
//! [env:common]
//! VERSION="1.2.3"
//!
//! # the same profile name, declared separately for App and Tool
//! [env:debug|App,Tool]
//! LOG_LEVEL:int=3
//! DATA_DIR=R"(C:\data\debug)"
//!
//! [other]       <- any other section closes the block
//! ignored=true
//! ```
//!
//! Parsing never fails: bad lines become [`ParseWarning`]s and are skipped.

use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::{ProfileStore, ScopeKey, Variable, VariableError, target_key};

const ENV_HEADER_PREFIX: &str = "[env:";

/// A config line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
  #[error("Invalid format at: {text} (line {line}: {reason})")]
  InvalidVariable {
    line: usize,
    text: String,
    reason: VariableError,
  },

  #[error("Missing profile name at: {text} (line {line})")]
  MissingProfileName { line: usize, text: String },
}

/// Result of parsing a config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedConfig {
  pub profiles: ProfileStore,
  pub warnings: Vec<ParseWarning>,
}

impl ParsedConfig {
  /// Whether the text declared any profile at all.
  pub fn found(&self) -> bool {
    self.profiles.has_profiles()
  }
}

/// The `[env:...]` block currently collecting variables.
struct Block {
  profile: String,
  scopes: Vec<ScopeKey>,
}

/// Parse config text into shared and per-target profile sets.
pub fn parse(text: &str) -> ParsedConfig {
  let mut parsed = ParsedConfig::default();
  let mut block: Option<Block> = None;

  for (index, raw) in text.lines().enumerate() {
    let line_no = index + 1;
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    if line.starts_with('[') {
      block = None;
      let Some(header) = line.strip_prefix(ENV_HEADER_PREFIX).and_then(|h| h.strip_suffix(']')) else {
        continue;
      };

      match parse_header(header) {
        Some(opened) => {
          for scope in &opened.scopes {
            parsed.profiles.declare(scope, &opened.profile);
          }
          debug!(profile = %opened.profile, scopes = opened.scopes.len(), line = line_no, "opened profile block");
          block = Some(opened);
        }
        None => {
          let warning = ParseWarning::MissingProfileName {
            line: line_no,
            text: line.to_string(),
          };
          warn!(%warning, "skipping config line");
          parsed.warnings.push(warning);
        }
      }
      continue;
    }

    let Some(block) = &block else {
      continue;
    };
    let Some((key, value)) = line.split_once('=') else {
      continue;
    };

    match Variable::parse(key, value) {
      Ok(variable) => {
        for scope in &block.scopes {
          parsed
            .profiles
            .add_variable(scope, &block.profile, variable.clone());
        }
      }
      Err(reason) => {
        let warning = ParseWarning::InvalidVariable {
          line: line_no,
          text: line.to_string(),
          reason,
        };
        warn!(%warning, "skipping config line");
        parsed.warnings.push(warning);
      }
    }
  }

  parsed
}

/// Split `name|t1,t2` into a profile name and its scopes.
///
/// No target list, or one with only blank entries, means the shared scope.
fn parse_header(header: &str) -> Option<Block> {
  let (name, targets) = match header.split_once('|') {
    Some((name, targets)) => (name.trim(), targets),
    None => (header.trim(), ""),
  };
  if name.is_empty() {
    return None;
  }

  let mut scopes: Vec<ScopeKey> = Vec::new();
  for target in targets.split(',').map(str::trim).filter(|t| !t.is_empty()) {
    let scope = ScopeKey::parse(target);
    let duplicate = scopes.iter().any(|s| target_key(s.as_str()) == target_key(scope.as_str()));
    if !duplicate {
      scopes.push(scope);
    }
  }
  if scopes.is_empty() {
    scopes.push(ScopeKey::Shared);
  }

  Some(Block {
    profile: name.to_string(),
    scopes,
  })
}
