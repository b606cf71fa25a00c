use crate::domain::models::Table;
use crate::inbound::file::{Csv, CsvOptions, Excel, Reader, WorkbookFormat};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Workbook,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Reads a single table from a delimited file or from one sheet of a
/// workbook. Without a sheet name the first sheet is used.
pub fn load_input(
    path: &Path,
    sheet: Option<&str>,
    format: WorkbookFormat,
    csv_options: CsvOptions,
) -> anyhow::Result<Table> {
    let kind = if format == WorkbookFormat::Auto {
        InputKind::from_path(path)
            .ok_or_else(|| anyhow::anyhow!("unsupported input file type: {}", path.display()))?
    } else {
        InputKind::Workbook
    };
    match kind {
        InputKind::Csv => {
            if sheet.is_some() {
                info!("Ignoring sheet name for delimited file {}", path.display());
            }
            Reader::read_csv(path, csv_options)
        }
        InputKind::Workbook => {
            let sheet_name = match sheet {
                Some(name) => name.to_string(),
                None => Reader::sheet_names(path, format)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("workbook {} has no sheets", path.display()))?,
            };
            let sheets = Reader::load_excel(path, &[sheet_name.as_str()], format)?;
            sheets
                .into_iter()
                .next()
                .map(|(_, table)| table)
                .ok_or_else(|| anyhow::anyhow!("sheet '{}' was not loaded", sheet_name))
        }
    }
}
