use crate::{
    domain::cleaning::coerce::parse_datetime,
    domain::models::{SheetSet, Table, TableResult, Value},
    inbound::file::{Reader, unique_headers},
};
use anyhow::Context;
use calamine::{Data, Range, Reader as CalamineReader, Sheets, open_workbook, open_workbook_auto};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Workbook reader to use. `Auto` picks one from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkbookFormat {
    #[default]
    Auto,
    Xlsx,
    Xls,
    Xlsb,
    Ods,
}

impl FromStr for WorkbookFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "xlsx" | "xlsm" | "openpyxl" => Ok(Self::Xlsx),
            "xls" | "xlrd" => Ok(Self::Xls),
            "xlsb" | "pyxlsb" => Ok(Self::Xlsb),
            "ods" | "odf" => Ok(Self::Ods),
            other => Err(format!("unknown workbook format '{}'", other)),
        }
    }
}

type Workbook = Sheets<BufReader<File>>;

fn open(path: &Path, format: WorkbookFormat, file_name: &str) -> anyhow::Result<Workbook> {
    let context = || format!("failed to open excel file: {}", file_name);
    let workbook = match format {
        WorkbookFormat::Auto => open_workbook_auto(path).with_context(context)?,
        WorkbookFormat::Xlsx => Sheets::Xlsx(open_workbook(path).with_context(context)?),
        WorkbookFormat::Xls => Sheets::Xls(open_workbook(path).with_context(context)?),
        WorkbookFormat::Xlsb => Sheets::Xlsb(open_workbook(path).with_context(context)?),
        WorkbookFormat::Ods => Sheets::Ods(open_workbook(path).with_context(context)?),
    };
    Ok(workbook)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Value::Int(*f as i64)
        }
        Data::Float(f) => Value::Float(*f),
        Data::Int(i) => Value::Int(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or(Value::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(d) => Value::Text(d.clone()),
        Data::Error(e) => {
            debug!("Reading error cell {:?} as null", e);
            Value::Null
        }
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Converts a worksheet range to a table using its first row as the header.
/// Blank rows are skipped.
pub fn table_from_range(range: &Range<Data>) -> TableResult<Table> {
    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => unique_headers(header_row.iter().map(|c| c.to_string()).collect()),
        None => return Ok(Table::default()),
    };
    let rows: Vec<Vec<Value>> = rows_iter
        .filter(|row| !row.iter().all(is_blank))
        .map(|row| row.iter().take(headers.len()).map(cell_to_value).collect())
        .collect();
    Table::from_rows(headers, rows)
}

pub trait Excel {
    fn sheet_names(path: &Path, format: WorkbookFormat) -> anyhow::Result<Vec<String>>;
    fn load_excel<S: AsRef<str>>(
        path: &Path,
        sheets: &[S],
        format: WorkbookFormat,
    ) -> anyhow::Result<SheetSet>;
}

impl Excel for Reader {
    fn sheet_names(path: &Path, format: WorkbookFormat) -> anyhow::Result<Vec<String>> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown file");
        Ok(open(path, format, file_name)?.sheet_names())
    }

    fn load_excel<S: AsRef<str>>(
        path: &Path,
        sheets: &[S],
        format: WorkbookFormat,
    ) -> anyhow::Result<SheetSet> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown file")
            .to_string();
        let mut workbook = open(path, format, &file_name)?;
        let available = workbook.sheet_names();
        let mut output = SheetSet::new();
        for sheet in sheets {
            let sheet_name = sheet.as_ref();
            if output.contains(sheet_name) {
                warn!("Sheet '{}' requested more than once, loading it once", sheet_name);
                continue;
            }
            if !available.iter().any(|s| s == sheet_name) {
                anyhow::bail!(
                    "worksheet '{}' not found in excel file '{}' (available: {})",
                    sheet_name,
                    file_name,
                    available.join(", ")
                );
            }
            let range = workbook.worksheet_range(sheet_name).with_context(|| {
                format!(
                    "failed to read worksheet '{}' from excel file: {}",
                    sheet_name, file_name
                )
            })?;
            let table = table_from_range(&range).with_context(|| {
                format!(
                    "failed to build table from worksheet '{}' of excel file: {}",
                    sheet_name, file_name
                )
            })?;
            info!(
                "Loaded sheet '{}' of '{}': {} rows x {} columns",
                sheet_name,
                file_name,
                table.height(),
                table.width()
            );
            output.insert(sheet_name, table);
        }
        Ok(output)
    }
}
