use crate::{
    domain::models::{Table, Value},
    inbound::file::{Reader, unique_headers},
};
use anyhow::Context;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// Spellings read as a missing value.
pub const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("csv file '{0}' is empty")]
pub struct EmptyCsv(pub String);

pub trait Csv {
    fn read_csv(path: &Path, options: CsvOptions) -> anyhow::Result<Table>;
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

fn all_present<F>(raw: &[Option<String>], pred: F) -> bool
where
    F: Fn(&str) -> bool,
{
    raw.iter().flatten().all(|s| pred(s))
}

/// Types a column of raw fields: all ints, else all numbers, else all bools,
/// otherwise everything stays text.
fn infer_column(raw: Vec<Option<String>>) -> Vec<Value> {
    if all_present(&raw, |s| s.parse::<i64>().is_ok()) {
        return raw
            .into_iter()
            .map(|f| f.and_then(|s| s.parse::<i64>().ok()).into())
            .collect();
    }
    if all_present(&raw, |s| s.parse::<f64>().is_ok()) {
        return raw
            .into_iter()
            .map(|f| f.and_then(|s| s.parse::<f64>().ok()).into())
            .collect();
    }
    if all_present(&raw, |s| parse_bool(s).is_some()) {
        return raw
            .into_iter()
            .map(|f| f.and_then(|s| parse_bool(&s)).into())
            .collect();
    }
    raw.into_iter().map(Into::into).collect()
}

impl Csv for Reader {
    fn read_csv(path: &Path, options: CsvOptions) -> anyhow::Result<Table> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown file")
            .to_string();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open csv file: {}", file_name))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(file);
        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("failed to read header of csv file: {}", file_name))?
            .iter()
            .map(str::to_string)
            .collect();
        let headers = unique_headers(headers);
        if headers.is_empty() {
            return Err(EmptyCsv(file_name).into());
        }
        let mut fields: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (row_num, record) in rdr.records().enumerate() {
            let record = record.with_context(|| {
                format!("failed to read row {} in csv file: {}", row_num + 1, file_name)
            })?;
            if record.len() > headers.len() {
                anyhow::bail!(
                    "row {} in csv file '{}' has {} fields, expected {}",
                    row_num + 1,
                    file_name,
                    record.len(),
                    headers.len()
                );
            }
            for (idx, column) in fields.iter_mut().enumerate() {
                let field = record
                    .get(idx)
                    .filter(|f| !NA_TOKENS.contains(f))
                    .map(str::to_string);
                column.push(field);
            }
        }
        let rows = fields.first().map(Vec::len).unwrap_or(0);
        debug!("Read {} row(s) from csv file '{}'", rows, file_name);
        let columns: Vec<Vec<Value>> = fields.into_iter().map(infer_column).collect();
        let table_rows = (0..rows)
            .map(|r| columns.iter().map(|c| c[r].clone()).collect())
            .collect();
        Ok(Table::from_rows(headers, table_rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn infers_column_types() {
        let file = write_temp("id,price,flag,name\n1,2.5,True,ana\n2,3,false,SD\n,NA,,luis\n");
        let table = Reader::read_csv(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(
            table.column("id").unwrap().values(),
            &[Value::Int(1), Value::Int(2), Value::Null]
        );
        assert_eq!(
            table.column("price").unwrap().values(),
            &[Value::Float(2.5), Value::Float(3.0), Value::Null]
        );
        assert_eq!(
            table.column("flag").unwrap().values(),
            &[Value::Bool(true), Value::Bool(false), Value::Null]
        );
        assert_eq!(table.column("name").unwrap().values()[1], Value::text("SD"));
    }

    #[test]
    fn mixed_column_stays_text() {
        let file = write_temp("code\n10\nA7\n");
        let table = Reader::read_csv(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(
            table.column("code").unwrap().values(),
            &[Value::text("10"), Value::text("A7")]
        );
    }

    #[test]
    fn custom_delimiter_and_short_rows() {
        let file = write_temp("a;b\n1;x\n2\n");
        let table = Reader::read_csv(file.path(), CsvOptions { delimiter: b';' }).unwrap();
        assert_eq!(table.column("b").unwrap().values()[1], Value::Null);
    }

    #[test]
    fn long_rows_are_rejected() {
        let file = write_temp("a,b\n1,2,3\n");
        assert!(Reader::read_csv(file.path(), CsvOptions::default()).is_err());
    }

    #[test]
    fn empty_file_is_empty_csv() {
        let file = write_temp("");
        let err = Reader::read_csv(file.path(), CsvOptions::default()).unwrap_err();
        assert!(err.downcast_ref::<EmptyCsv>().is_some());
    }

    #[test]
    fn header_only_gives_empty_table() {
        let file = write_temp("a,b\n");
        let table = Reader::read_csv(file.path(), CsvOptions::default()).unwrap();
        assert_eq!(table.width(), 2);
        assert!(table.is_empty());
    }
}
