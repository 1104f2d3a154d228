use std::fmt::Write;

use super::{lint_level, Report};

pub(super) fn render(report: &Report) -> String {
  let mut rows = String::new();
  for issue in &report.issues {
    let _ = writeln!(
      rows,
      "      <tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
      lint_level(issue.severity),
      escape(&issue.file_path),
      issue.line,
      issue.column,
      escape(issue.severity.as_str()),
      escape(&issue.rule_id),
      escape(&issue.message),
    );
    if !issue.detail.is_empty() {
      let _ = writeln!(
        rows,
        "      <tr class=\"detail\"><td colspan=\"6\">{}</td></tr>",
        escape(&issue.detail)
      );
    }
  }

  let title = format!(
    "Analysis report for {} ({})",
    escape(&report.contract),
    escape(&report.file)
  );
  format!(
    r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
      body {{ font-family: sans-serif; margin: 2em; }}
      table {{ border-collapse: collapse; width: 100%; }}
      th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; }}
      tr.error td {{ background: #fdecea; }}
      tr.warning td {{ background: #fff8e1; }}
      tr.detail td {{ color: #555; font-size: 0.9em; }}
    </style>
  </head>
  <body>
    <h1>{title}</h1>
    <p>{count} issue(s) found.</p>
    <table>
      <tr><th>File</th><th>Line</th><th>Column</th><th>Severity</th><th>Rule</th><th>Message</th></tr>
{rows}    </table>
  </body>
</html>"#,
    count = report.issues.len(),
  )
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::tests::report;

  #[test]
  fn escapes_every_field() {
    let mut report = report();
    report.contract = "<Token>".into();
    report.issues[0].message = "a < b && \"c\"".into();
    report.issues[0].detail = "<script>alert('x')</script>".into();

    let out = render(&report);
    assert!(out.starts_with("<!DOCTYPE html>"));
    assert!(out.contains("&lt;Token&gt;"));
    assert!(out.contains("a &lt; b &amp;&amp; &quot;c&quot;"));
    assert!(out.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    assert!(!out.contains("<script>"));
    assert!(out.contains("3 issue(s) found."));
  }
}
