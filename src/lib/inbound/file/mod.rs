pub mod csv;
pub mod excel;

pub use csv::{Csv, CsvOptions, EmptyCsv};
pub use excel::{Excel, WorkbookFormat};

pub struct Reader;

/// Names empty headers `Unnamed: {index}` and suffixes repeats with `.1`,
/// `.2`, ... so every column name is unique.
pub fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut output: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 0;
        while output.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", base, suffix);
        }
        output.push(candidate);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_made_unique() {
        let headers = unique_headers(vec![
            "id".into(),
            "".into(),
            "id".into(),
            "name".into(),
            "id".into(),
        ]);
        assert_eq!(headers, vec!["id", "Unnamed: 1", "id.1", "name", "id.2"]);
    }
}
