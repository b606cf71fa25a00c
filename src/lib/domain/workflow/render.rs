use crate::domain::audit::SentinelReport;
use crate::domain::models::Table;
use comfy_table::{ContentArrangement, Table as CliTable, presets::UTF8_FULL};

/// First `limit` rows of `table` as a printable grid.
pub fn preview(table: &Table, limit: usize) -> CliTable {
    let mut grid = CliTable::new();
    grid.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(table.column_names());
    for row in table.rows().take(limit) {
        grid.add_row(row.iter().map(|v| v.to_string()).collect::<Vec<String>>());
    }
    grid
}

pub fn sentinel_report(report: &SentinelReport) -> CliTable {
    let mut grid = CliTable::new();
    grid.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Column".to_string(),
            format!("Count of {}", report.marker),
            format!("% of {}", report.marker),
        ]);
    for entry in &report.columns {
        grid.add_row(vec![
            entry.column.clone(),
            entry.count.to_string(),
            format!("{:.2}", entry.percent),
        ]);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::detect_sentinel;
    use crate::domain::models::Value;

    fn table() -> Table {
        Table::from_rows(
            vec!["zona".into(), "monto".into()],
            vec![
                vec![Value::text("SD"), Value::Int(5)],
                vec![Value::text("norte"), Value::Int(8)],
                vec![Value::text("sur"), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn preview_limits_rows() {
        let grid = preview(&table(), 2);
        let rendered = grid.to_string();
        assert!(rendered.contains("zona"));
        assert!(rendered.contains("norte"));
        assert!(!rendered.contains("sur"));
    }

    #[test]
    fn sentinel_grid_lists_columns() {
        let report = detect_sentinel(&table(), "SD");
        let rendered = sentinel_report(&report).to_string();
        assert!(rendered.contains("zona"));
        assert!(rendered.contains("33.33"));
        assert!(!rendered.contains("monto"));
    }
}
