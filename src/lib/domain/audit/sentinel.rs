use crate::domain::models::{Column, Table, TableResult, Value};
use tracing::debug;

/// Placeholder used in source sheets for an intentionally missing value.
pub const DEFAULT_SENTINEL: &str = "SD";

#[derive(Debug, Clone, PartialEq)]
pub struct SentinelCount {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentinelReport {
    pub marker: String,
    pub total_rows: usize,
    pub columns: Vec<SentinelCount>,
}

impl SentinelReport {
    pub fn is_clean(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&SentinelCount> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn to_table(&self) -> TableResult<Table> {
        Table::new(vec![
            Column::new(
                "column",
                self.columns
                    .iter()
                    .map(|c| Value::text(c.column.clone()))
                    .collect(),
            ),
            Column::new(
                "count",
                self.columns
                    .iter()
                    .map(|c| Value::Int(c.count as i64))
                    .collect(),
            ),
            Column::new(
                "percent",
                self.columns.iter().map(|c| Value::Float(c.percent)).collect(),
            ),
        ])
    }
}

/// Counts exact `marker` text cells per column. Only columns that contain the
/// marker at least once are reported.
pub fn detect_sentinel(table: &Table, marker: &str) -> SentinelReport {
    let total_rows = table.height();
    let columns = table
        .columns()
        .iter()
        .filter_map(|column| {
            let count = column
                .values()
                .iter()
                .filter(|v| v.as_text() == Some(marker))
                .count();
            debug!("Column '{}': {} '{}' value(s)", column.name(), count, marker);
            (count > 0).then(|| SentinelCount {
                column: column.name().to_string(),
                count,
                percent: count as f64 / total_rows as f64 * 100.0,
            })
        })
        .collect();
    SentinelReport {
        marker: marker.to_string(),
        total_rows,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            vec!["region".into(), "sales".into(), "notes".into()],
            vec![
                vec![Value::text("SD"), Value::Int(10), Value::text("ok")],
                vec![Value::text("north"), Value::text("SD"), Value::text(" SD")],
                vec![Value::text("SD"), Value::Int(7), Value::text("sd")],
                vec![Value::text("south"), Value::Int(3), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn counts_exact_marker_per_column() {
        let report = detect_sentinel(&table(), DEFAULT_SENTINEL);
        assert_eq!(report.total_rows, 4);
        assert_eq!(
            report.columns,
            vec![
                SentinelCount {
                    column: "region".into(),
                    count: 2,
                    percent: 50.0
                },
                SentinelCount {
                    column: "sales".into(),
                    count: 1,
                    percent: 25.0
                },
            ]
        );
        assert!(report.get("notes").is_none());
    }

    #[test]
    fn custom_marker_and_clean_table() {
        let report = detect_sentinel(&table(), "N/D");
        assert!(report.is_clean());
    }

    #[test]
    fn empty_table_reports_nothing() {
        let report = detect_sentinel(&Table::default(), DEFAULT_SENTINEL);
        assert!(report.is_clean());
        assert_eq!(report.total_rows, 0);
    }

    #[test]
    fn report_as_table() {
        let out = detect_sentinel(&table(), DEFAULT_SENTINEL).to_table().unwrap();
        assert_eq!(out.column_names(), vec!["column", "count", "percent"]);
        assert_eq!(out.height(), 2);
        assert_eq!(out.column("count").unwrap().values()[0], Value::Int(2));
    }
}
