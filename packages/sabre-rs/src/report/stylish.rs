use std::fmt::Write;

use analysis::Severity;

use super::{lint_level, Report};

pub(super) fn render(report: &Report) -> String {
  let mut out = String::new();
  for (file, issues) in report.by_file() {
    let _ = writeln!(out, "{file}");
    for issue in issues {
      let position = format!("{}:{}", issue.line, issue.column);
      let _ = writeln!(
        out,
        "  {position:>7}  {:<7}  {}  {}",
        lint_level(issue.severity),
        issue.message,
        issue.rule_id
      );
    }
    out.push('\n');
  }

  let errors = report
    .issues
    .iter()
    .filter(|issue| issue.severity == Severity::High)
    .count();
  let warnings = report.issues.len() - errors;
  let _ = write!(
    out,
    "✖ {} {} ({} {}, {} {})",
    report.issues.len(),
    plural(report.issues.len(), "problem"),
    errors,
    plural(errors, "error"),
    warnings,
    plural(warnings, "warning")
  );
  out
}

fn plural(count: usize, word: &str) -> String {
  if count == 1 {
    word.to_string()
  } else {
    format!("{word}s")
  }
}
