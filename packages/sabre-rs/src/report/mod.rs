//! Rendering of normalised findings.

use analysis::{CanonicalIssue, Severity};
use clap::ValueEnum;
use serde::Serialize;

mod compact;
mod html;
mod json;
mod stylish;
mod table;
mod text;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
  #[default]
  Text,
  Stylish,
  Compact,
  Table,
  Html,
  Json,
}

/// Findings for one analysed contract.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
  /// The input file as given on the command line.
  pub file: String,
  pub contract: String,
  pub issues: Vec<CanonicalIssue>,
}

impl Report {
  fn no_issues_message(&self) -> String {
    format!(
      "✔ No errors/warnings found in {} for contract: {}",
      self.file, self.contract
    )
  }

  /// Issues grouped by file, keeping the issue order.
  fn by_file(&self) -> Vec<(&str, Vec<&CanonicalIssue>)> {
    let mut groups: Vec<(&str, Vec<&CanonicalIssue>)> = Vec::new();
    for issue in &self.issues {
      match groups.last_mut() {
        Some((file, issues)) if *file == issue.file_path => issues.push(issue),
        _ => groups.push((issue.file_path.as_str(), vec![issue])),
      }
    }
    groups
  }
}

pub fn render(report: &Report, format: Format) -> serde_json::Result<String> {
  if report.issues.is_empty() && format != Format::Json {
    return Ok(report.no_issues_message());
  }

  Ok(match format {
    Format::Text => text::render(report),
    Format::Stylish => stylish::render(report),
    Format::Compact => compact::render(report),
    Format::Table => table::render(report),
    Format::Html => html::render(report),
    Format::Json => json::render(report)?,
  })
}

/// `error` for high severity, `warning` otherwise, as linters label them.
fn lint_level(severity: Severity) -> &'static str {
  match severity {
    Severity::High => "error",
    _ => "warning",
  }
}
