use crate::domain::models::Table;
use anyhow::Context;
use csv::WriterBuilder;
use std::path::Path;
use tracing::info;

pub fn write_csv(table: &Table, path: &Path, delimiter: u8) -> anyhow::Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("failed to create csv file: {}", path.display()))?;
    wtr.write_record(table.column_names())
        .context("failed to write csv header")?;
    for (row_num, row) in table.rows().enumerate() {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("failed to write row {} to csv", row_num + 1))?;
    }
    wtr.flush()
        .with_context(|| format!("failed to flush csv file: {}", path.display()))?;
    info!(
        "Wrote {} row(s) to '{}'",
        table.height(),
        path.display()
    );
    Ok(())
}
