use std::fmt::Write;

use super::Report;

pub(super) fn render(report: &Report) -> String {
  let mut out = String::new();
  for issue in &report.issues {
    let _ = writeln!(out, "==== {} ====", issue.title);
    let _ = writeln!(out, "Severity: {}", issue.severity);
    let _ = writeln!(out, "File: {}", issue.file_path);
    let _ = writeln!(out, "Rule: {}", issue.rule_id);
    let _ = writeln!(out, "Message: {}", issue.message);
    if !issue.detail.is_empty() {
      let _ = writeln!(out, "Detail: {}", issue.detail);
    }
    let _ = writeln!(out, "Location: line {}, column {}", issue.line, issue.column);
    out.push('\n');
  }
  out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::tests::report;

  #[test]
  fn renders_one_block_per_issue() {
    let out = render(&report());
    assert_eq!(out.matches("==== ").count(), 3);
    assert!(out.starts_with("==== SWC-101 title ====\nSeverity: High\nFile: contracts/Base.sol\n"));
    assert!(out.contains("Detail: SWC-107 detail\nLocation: line 12, column 9"));
  }
}
