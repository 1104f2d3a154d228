//! Translation of service findings into source positions, with deduplication and stable ordering.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::request::AnalysisRequest;
use crate::sourcemap::{decode, InstructionOffsets, LineIndex, SourceMapEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  High,
  Medium,
  Low,
  Unknown,
}

impl Severity {
  pub fn from_service(value: &str) -> Self {
    match value {
      "High" => Severity::High,
      "Medium" => Severity::Medium,
      "Low" => Severity::Low,
      _ => Severity::Unknown,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Severity::High => "High",
      Severity::Medium => "Medium",
      Severity::Low => "Low",
      Severity::Unknown => "Unknown",
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Opaque location pointer as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRef {
  /// `start:length:file`
  pub source_map: String,
  /// `text`, `solidity-file`, `evm-<fork>-bytecode`, or absent.
  pub source_format: Option<String>,
}

impl LocationRef {
  fn is_bytecode(&self) -> bool {
    self
      .source_format
      .as_deref()
      .is_some_and(|format| format.starts_with("evm-") && format.ends_with("-bytecode"))
  }

  fn parts(&self) -> Option<(usize, usize, usize)> {
    let mut fields = self.source_map.split(':');
    let start = fields.next()?.trim().parse().ok()?;
    let length = fields.next()?.trim().parse().ok()?;
    let file = fields.next()?.trim().parse().ok()?;
    Some((start, length, file))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
  pub rule_id: String,
  pub title: String,
  pub severity: Severity,
  pub location: Option<LocationRef>,
  pub message: String,
  pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIssue {
  pub rule_id: String,
  pub title: String,
  pub severity: Severity,
  pub file_path: String,
  /// 1-based; 0 when the location could not be resolved.
  pub line: usize,
  pub column: usize,
  pub message: String,
  pub detail: String,
}

impl CanonicalIssue {
  fn key(&self) -> (&str, &str, usize, usize) {
    (&self.rule_id, &self.file_path, self.line, self.column)
  }
}

/// Resolves locations against the sources and source maps of one request.
pub struct IssueNormalizer<'a> {
  entry: &'a str,
  source_list: &'a [String],
  lines: BTreeMap<&'a str, LineIndex<'a>>,
  instructions: Vec<SourceMapEntry>,
  offsets: InstructionOffsets,
}

impl<'a> IssueNormalizer<'a> {
  pub fn new(request: &'a AnalysisRequest) -> Self {
    let artifact = &request.artifact;
    let lines = request
      .sources
      .iter()
      .map(|(path, text)| (path.as_str(), LineIndex::new(text)))
      .collect();
    let (map, code) = if artifact.deployed_source_map.is_empty() {
      (&artifact.source_map, &artifact.bytecode)
    } else {
      (&artifact.deployed_source_map, &artifact.deployed_bytecode)
    };

    Self {
      entry: &request.entry,
      source_list: &request.source_list,
      lines,
      instructions: decode(map),
      offsets: InstructionOffsets::new(code),
    }
  }

  /// Canonical issues, deduplicated and ordered by position then rule.
  pub fn normalize(&self, raw: Vec<RawIssue>) -> Vec<CanonicalIssue> {
    let resolved = raw.into_iter().map(|issue| self.resolve(issue)).collect();
    dedup_and_sort(resolved)
  }

  fn resolve(&self, issue: RawIssue) -> CanonicalIssue {
    let position = issue
      .location
      .as_ref()
      .and_then(|location| self.position(location));
    let (file_path, line, column) = match position {
      Some(position) => position,
      None => {
        tracing::debug!(rule = %issue.rule_id, location = ?issue.location, "unresolved issue location");
        (self.entry.to_string(), 0, 0)
      }
    };

    CanonicalIssue {
      rule_id: issue.rule_id,
      title: issue.title,
      severity: issue.severity,
      file_path,
      line,
      column,
      message: issue.message,
      detail: issue.detail,
    }
  }

  fn position(&self, location: &LocationRef) -> Option<(String, usize, usize)> {
    let (start, _length, file) = location.parts()?;
    let (offset, file) = if location.is_bytecode() {
      let entry = self.instructions.get(self.offsets.instruction_at(start)?)?;
      (entry.start, usize::try_from(entry.file).ok()?)
    } else {
      (start, file)
    };

    let path = self.source_list.get(file)?;
    let (line, column) = self.lines.get(path.as_str())?.line_column(offset)?;
    Some((path.clone(), line, column))
  }
}

/// Drops repeats of `(rule_id, file_path, line, column)` keeping the first seen, then stable-sorts
/// by `(file_path, line, column, rule_id)`. Idempotent.
pub fn dedup_and_sort(issues: Vec<CanonicalIssue>) -> Vec<CanonicalIssue> {
  let mut seen = HashSet::new();
  let mut unique: Vec<CanonicalIssue> = issues
    .into_iter()
    .filter(|issue| {
      seen.insert((
        issue.rule_id.clone(),
        issue.file_path.clone(),
        issue.line,
        issue.column,
      ))
    })
    .collect();

  unique.sort_by(|a, b| {
    let (a_rule, a_file, a_line, a_column) = a.key();
    let (b_rule, b_file, b_line, b_column) = b.key();
    (a_file, a_line, a_column, a_rule).cmp(&(b_file, b_line, b_column, b_rule))
  });
  unique
}
