use super::Report;

pub(super) fn render(report: &Report) -> serde_json::Result<String> {
  serde_json::to_string_pretty(report)
}
