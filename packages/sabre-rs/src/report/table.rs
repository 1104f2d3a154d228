use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use analysis::Severity;

use super::Report;

pub(super) fn render(report: &Report) -> String {
  report
    .by_file()
    .into_iter()
    .map(|(file, issues)| {
      let mut table = Table::new();
      table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
          header_cell("Line"),
          header_cell("Column"),
          header_cell("Severity"),
          header_cell("Rule"),
          header_cell("Message"),
        ]);
      for column in 0..2 {
        if let Some(column) = table.column_mut(column) {
          column.set_cell_alignment(CellAlignment::Right);
        }
      }

      for issue in issues {
        table.add_row(vec![
          Cell::new(issue.line),
          Cell::new(issue.column),
          severity_cell(issue.severity),
          Cell::new(&issue.rule_id),
          Cell::new(&issue.message),
        ]);
      }
      format!("{file}\n{table}")
    })
    .collect::<Vec<_>>()
    .join("\n\n")
}

fn header_cell(label: &str) -> Cell {
  Cell::new(label)
    .fg(Color::Cyan)
    .add_attribute(Attribute::Bold)
}

fn severity_cell(severity: Severity) -> Cell {
  let color = match severity {
    Severity::High => Color::Red,
    Severity::Medium => Color::Yellow,
    Severity::Low => Color::Blue,
    Severity::Unknown => Color::DarkGrey,
  };
  Cell::new(severity).fg(color)
}
