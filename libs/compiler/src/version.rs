//! Solidity `pragma solidity` extraction and release matching.

use once_cell::sync::Lazy;
use regex::Regex;
use semver::{Version, VersionReq};

use crate::internal::errors::{Error, Result};
use crate::internal::source_text::strip_comments;
use crate::release::{CompilerRelease, ReleaseIndex};

static PRAGMA: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("valid pragma regex"));

static COMPARATOR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(\^|~|>=|<=|>|<|=)?\s*v?([0-9xX*]+(?:\.[0-9xX*]+){0,2})")
    .expect("valid comparator regex")
});

/// A parsed pragma constraint. Solidity allows `||` alternatives, each of which
/// becomes one semver requirement.
#[derive(Debug, Clone)]
pub struct Constraint {
  raw: String,
  alternatives: Vec<VersionReq>,
}

impl Constraint {
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn matches(&self, version: &Version) -> bool {
    self.alternatives.iter().any(|req| req.matches(version))
  }
}

/// Returns the constraint text of the first `pragma solidity` directive in `source`.
/// `file` only names the source in the error.
pub fn extract_constraint(source: &str, file: &str) -> Result<String> {
  let stripped = strip_comments(source);
  PRAGMA
    .captures(&stripped)
    .and_then(|captures| captures.get(1))
    .map(|constraint| constraint.as_str().trim().to_string())
    .filter(|constraint| !constraint.is_empty())
    .ok_or_else(|| Error::NoVersionDeclared {
      file: file.to_string(),
    })
}

pub fn parse_constraint(text: &str) -> Result<Constraint> {
  let invalid = |reason: String| Error::InvalidVersionConstraint {
    constraint: text.to_string(),
    reason,
  };

  let mut alternatives = Vec::new();
  for alternative in text.split("||") {
    let requirement = to_semver_requirement(alternative.trim()).map_err(invalid)?;
    let parsed = VersionReq::parse(&requirement).map_err(|err| invalid(err.to_string()))?;
    alternatives.push(parsed);
  }

  Ok(Constraint {
    raw: text.trim().to_string(),
    alternatives,
  })
}

/// Picks the highest release in `index` satisfying `constraint`.
pub fn resolve_release(constraint: &Constraint, index: &ReleaseIndex) -> Result<CompilerRelease> {
  let (version, entry) = index
    .iter()
    .rev()
    .find(|(version, _)| constraint.matches(version))
    .ok_or_else(|| Error::NoMatchingRelease {
      constraint: constraint.as_str().to_string(),
    })?;

  tracing::debug!(constraint = constraint.as_str(), %version, "resolved solc release");
  Ok(CompilerRelease {
    version_constraint: constraint.as_str().to_string(),
    resolved_version: version.clone(),
    artifact_locator: entry.path.clone(),
    sha256: entry.sha256.clone(),
  })
}

fn to_semver_requirement(alternative: &str) -> std::result::Result<String, String> {
  if alternative.is_empty() {
    return Err("empty version range".into());
  }

  if let Some((low, high)) = alternative.split_once(" - ") {
    let low = bare_version(low.trim())?;
    let high = bare_version(high.trim())?;
    return Ok(format!(">={low}, <={high}"));
  }

  let mut comparators = Vec::new();
  let mut consumed = 0;
  for captures in COMPARATOR.captures_iter(alternative) {
    let whole = captures.get(0).expect("match has a group 0");
    let gap = &alternative[consumed..whole.start()];
    if !gap.chars().all(|ch| ch.is_whitespace() || ch == ',') {
      return Err(format!("unexpected \"{}\"", gap.trim()));
    }
    consumed = whole.end();

    let version = captures[2].replace(['x', 'X'], "*");
    let comparator = match captures.get(1) {
      Some(op) => format!("{}{version}", op.as_str()),
      None if version.contains('*') => version,
      None => format!("={version}"),
    };
    comparators.push(comparator);
  }

  let rest = &alternative[consumed..];
  if !rest.trim().is_empty() {
    return Err(format!("unexpected \"{}\"", rest.trim()));
  }
  if comparators.is_empty() {
    return Err("no version found".into());
  }
  Ok(comparators.join(", "))
}

fn bare_version(text: &str) -> std::result::Result<String, String> {
  let trimmed = text.trim_start_matches('v');
  if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
    return Err(format!("\"{text}\" is not a version"));
  }
  Ok(trimmed.to_string())
}
