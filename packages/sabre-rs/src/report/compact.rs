use super::Report;

pub(super) fn render(report: &Report) -> String {
  report
    .issues
    .iter()
    .map(|issue| {
      format!(
        "{}: line {}, col {}, {} - {} ({})",
        issue.file_path, issue.line, issue.column, issue.severity, issue.message, issue.rule_id
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}
