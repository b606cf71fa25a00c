use crate::domain::cleaning::{
    coerce,
    expression::Expression,
    options::CleanOptions,
    text::title_case,
};
use crate::domain::models::{Column, Table, TableError, TableResult, Value};
use std::collections::HashSet;
use tracing::{debug, info};

fn map_text_column<F>(table: &mut Table, name: &str, f: F) -> TableResult<()>
where
    F: Fn(&str) -> String,
{
    table.column_mut(name)?.map_values(|v| match v {
        Value::Text(s) => Value::Text(f(s)),
        other => other.clone(),
    });
    Ok(())
}

fn convert_column<F>(table: &mut Table, name: &str, f: F) -> TableResult<()>
where
    F: Fn(&Value) -> Result<Value, String>,
{
    table.column_mut(name)?.try_map_values(|row, v| {
        f(v).map_err(|reason| TableError::Conversion {
            column: name.to_string(),
            row,
            reason,
        })
    })
}

fn drop_duplicate_rows(table: &mut Table) {
    let mut seen = HashSet::new();
    let mask: Vec<bool> = table
        .rows()
        .map(|row| seen.insert(row.into_iter().cloned().collect::<Vec<Value>>()))
        .collect();
    table.retain_rows(&mask);
}

fn drop_null_rows(table: &mut Table) {
    let mask: Vec<bool> = table
        .rows()
        .map(|row| !row.iter().any(|v| v.is_null()))
        .collect();
    table.retain_rows(&mask);
}

/// Returns a cleaned copy of `table`. Steps run in this fixed order, each only
/// when its option is set:
///
/// 1. drop duplicate rows
/// 2. drop rows with nulls
/// 3. fill nulls per column
/// 4. lenient datetime conversion
/// 5. upper, then lower, then title case
/// 6. strip whitespace from every text cell
/// 7. rename columns
/// 8. drop columns
/// 9. mark categorical columns
/// 10. replace values
/// 11. constant columns
/// 12. computed columns
/// 13. datetime conversion with explicit formats
/// 14. integer conversion
/// 15. float conversion
pub fn clean(table: &Table, options: &CleanOptions) -> TableResult<Table> {
    let mut cleaned = table.clone();
    let start_rows = cleaned.height();

    if options.drop_duplicates {
        drop_duplicate_rows(&mut cleaned);
        debug!("Dropped {} duplicate row(s)", start_rows - cleaned.height());
    }

    if options.drop_na {
        let before = cleaned.height();
        drop_null_rows(&mut cleaned);
        debug!("Dropped {} row(s) with nulls", before - cleaned.height());
    }

    for (name, fill) in &options.fill_na {
        if let Ok(column) = cleaned.column_mut(name) {
            column.map_values(|v| if v.is_null() { fill.clone() } else { v.clone() });
        }
    }

    for name in &options.convert_to_datetime {
        cleaned.column_mut(name)?.map_values(coerce::to_datetime);
    }

    for name in &options.uppercase_columns {
        map_text_column(&mut cleaned, name, str::to_uppercase)?;
    }
    for name in &options.lowercase_columns {
        map_text_column(&mut cleaned, name, str::to_lowercase)?;
    }
    for name in &options.titlecase_columns {
        map_text_column(&mut cleaned, name, title_case)?;
    }

    if options.strip_spaces {
        for column in cleaned.columns_mut() {
            column.map_values(|v| match v {
                Value::Text(s) => Value::Text(s.trim().to_string()),
                other => other.clone(),
            });
        }
    }

    if !options.rename_columns.is_empty() {
        cleaned.rename_columns(&options.rename_columns)?;
    }

    if !options.drop_columns.is_empty() {
        cleaned.drop_columns(&options.drop_columns)?;
    }

    for name in &options.categorize_columns {
        cleaned.column_mut(name)?.set_categorical(true);
    }

    for (name, replacements) in &options.replace_values {
        cleaned.column_mut(name)?.map_values(|v| {
            replacements
                .iter()
                .find(|(from, _)| from == v)
                .map(|(_, to)| to.clone())
                .unwrap_or_else(|| v.clone())
        });
    }

    for (name, value) in &options.new_columns {
        let height = cleaned.height();
        cleaned.set_column(Column::new(name.clone(), vec![value.clone(); height]))?;
    }

    for (name, source) in &options.computed_columns {
        let expression = Expression::parse(source)?;
        debug!("Computing column '{}' from '{}'", name, expression.source());
        let values = expression.evaluate(&cleaned)?;
        cleaned.set_column(Column::new(name.clone(), values))?;
    }

    for (name, fmt) in &options.convert_date_columns {
        cleaned
            .column_mut(name)?
            .map_values(|v| coerce::to_datetime_with_format(v, fmt));
    }

    for name in &options.convert_to_int_columns {
        convert_column(&mut cleaned, name, coerce::to_int)?;
    }

    for name in &options.convert_to_float {
        convert_column(&mut cleaned, name, coerce::to_float)?;
    }

    info!(
        "Cleaned table: {} -> {} row(s), {} column(s)",
        start_rows,
        cleaned.height(),
        cleaned.width()
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

    fn raw() -> Table {
        Table::from_rows(
            vec![
                "name".into(),
                "city".into(),
                "qty".into(),
                "price".into(),
                "date".into(),
            ],
            vec![
                vec![
                    Value::text("  ana  "),
                    Value::text("santiago"),
                    Value::text("3"),
                    Value::text("2.5"),
                    Value::text("01/02/2024"),
                ],
                vec![
                    Value::text("  ana  "),
                    Value::text("santiago"),
                    Value::text("3"),
                    Value::text("2.5"),
                    Value::text("01/02/2024"),
                ],
                vec![
                    Value::text("LUIS"),
                    Value::Null,
                    Value::text("SD"),
                    Value::text("4"),
                    Value::text("bad"),
                ],
            ],
        )
        .unwrap()
    }

    fn options() -> CleanOptions {
        CleanOptions {
            strip_spaces: false,
            ..CleanOptions::default()
        }
    }

    #[test]
    fn default_options_only_strip() {
        let cleaned = clean(&raw(), &CleanOptions::default()).unwrap();
        assert_eq!(cleaned.height(), 3);
        assert_eq!(cleaned.column("name").unwrap().values()[0], Value::text("ana"));
        assert_eq!(cleaned.column("qty").unwrap().values()[0], Value::text("3"));
    }

    #[test]
    fn input_is_not_modified() {
        let table = raw();
        let _ = clean(&table, &CleanOptions::default()).unwrap();
        assert_eq!(table.column("name").unwrap().values()[0], Value::text("  ana  "));
    }

    #[test]
    fn dedupe_then_drop_na() {
        let opts = CleanOptions {
            drop_duplicates: true,
            drop_na: true,
            ..options()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        assert_eq!(cleaned.height(), 1);
        assert_eq!(cleaned.column("name").unwrap().values()[0], Value::text("  ana  "));
    }

    #[test]
    fn fill_na_ignores_unknown_columns() {
        let mut fill_na = BTreeMap::new();
        fill_na.insert("city".to_string(), Value::text("unknown"));
        fill_na.insert("ghost".to_string(), Value::Int(0));
        let opts = CleanOptions { fill_na, ..options() };
        let cleaned = clean(&raw(), &opts).unwrap();
        assert_eq!(cleaned.column("city").unwrap().values()[2], Value::text("unknown"));
        assert!(!cleaned.has_column("ghost"));
    }

    #[test]
    fn case_conversions_run_before_strip() {
        let opts = CleanOptions {
            titlecase_columns: vec!["name".into()],
            uppercase_columns: vec!["city".into()],
            ..CleanOptions::default()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        let names = cleaned.column("name").unwrap().values();
        assert_eq!(names[0], Value::text("Ana"));
        assert_eq!(names[2], Value::text("Luis"));
        let cities = cleaned.column("city").unwrap().values();
        assert_eq!(cities[0], Value::text("SANTIAGO"));
        assert_eq!(cities[2], Value::Null);
    }

    #[test]
    fn rename_happens_before_later_steps() {
        let mut rename_columns = BTreeMap::new();
        rename_columns.insert("qty".to_string(), "cantidad".to_string());
        let mut replace_values = BTreeMap::new();
        replace_values.insert(
            "cantidad".to_string(),
            vec![(Value::text("SD"), Value::Null)],
        );
        let opts = CleanOptions {
            rename_columns,
            replace_values,
            convert_to_int_columns: vec!["cantidad".into()],
            drop_columns: vec!["date".into()],
            ..options()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        assert_eq!(cleaned.column_names(), vec!["name", "city", "cantidad", "price"]);
        assert_eq!(
            cleaned.column("cantidad").unwrap().values(),
            &[Value::Int(3), Value::Int(3), Value::Null]
        );
    }

    #[test]
    fn computed_columns_see_earlier_conversions_not_later_ones() {
        let mut computed_columns = IndexMap::new();
        computed_columns.insert("total".to_string(), "price * 2".to_string());
        let opts = CleanOptions {
            computed_columns,
            convert_to_float: vec!["price".into()],
            ..options()
        };
        // price is still text when the expression runs
        assert!(matches!(
            clean(&raw(), &opts),
            Err(TableError::Expression(_))
        ));

        let mut computed_columns = IndexMap::new();
        computed_columns.insert("label".to_string(), "name + '@' + price".to_string());
        let opts = CleanOptions {
            computed_columns,
            convert_to_float: vec!["price".into()],
            ..CleanOptions::default()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        assert_eq!(cleaned.column("label").unwrap().values()[0], Value::text("ana@2.5"));
        assert_eq!(cleaned.column("price").unwrap().values()[2], Value::Float(4.0));
    }

    #[test]
    fn new_columns_and_categories() {
        let mut new_columns = IndexMap::new();
        new_columns.insert("source".to_string(), Value::text("ventas.xlsx"));
        let opts = CleanOptions {
            new_columns,
            categorize_columns: vec!["city".into()],
            ..options()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        assert!(cleaned.column("city").unwrap().is_categorical());
        assert_eq!(
            cleaned.column("source").unwrap().values(),
            vec![Value::text("ventas.xlsx"); 3].as_slice()
        );
    }

    #[test]
    fn computed_columns_can_use_earlier_computed_columns() {
        let table = Table::new(vec![
            Column::new("price", vec![Value::Int(100), Value::Int(40)]),
            Column::new("qty", vec![Value::Int(2), Value::Int(5)]),
        ])
        .unwrap();
        let mut computed_columns = IndexMap::new();
        computed_columns.insert("subtotal".to_string(), "price * qty".to_string());
        computed_columns.insert("iva".to_string(), "subtotal * 0.19".to_string());
        let opts = CleanOptions {
            computed_columns,
            ..CleanOptions::default()
        };
        let cleaned = clean(&table, &opts).unwrap();
        assert_eq!(cleaned.column_names(), vec!["price", "qty", "subtotal", "iva"]);
        assert_eq!(
            cleaned.column("subtotal").unwrap().values(),
            &[Value::Int(200), Value::Int(200)]
        );
        assert_eq!(cleaned.column("iva").unwrap().values()[0], Value::Float(200.0 * 0.19));
    }

    #[test]
    fn new_columns_are_appended_in_written_order() {
        let table = Table::new(vec![Column::new("a", vec![Value::Int(1)])]).unwrap();
        let mut new_columns = IndexMap::new();
        new_columns.insert("zona".to_string(), Value::text("norte"));
        new_columns.insert("anio".to_string(), Value::Int(2024));
        let opts = CleanOptions {
            new_columns,
            ..CleanOptions::default()
        };
        let cleaned = clean(&table, &opts).unwrap();
        assert_eq!(cleaned.column_names(), vec!["a", "zona", "anio"]);
    }

    #[test]
    fn date_conversions() {
        let mut convert_date_columns = BTreeMap::new();
        convert_date_columns.insert("date".to_string(), "%d/%m/%Y".to_string());
        let opts = CleanOptions {
            convert_date_columns,
            ..options()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            cleaned.column("date").unwrap().values(),
            &[Value::DateTime(expected), Value::DateTime(expected), Value::Null]
        );

        let opts = CleanOptions {
            convert_to_datetime: vec!["date".into()],
            ..options()
        };
        let cleaned = clean(&raw(), &opts).unwrap();
        let month_first = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            cleaned.column("date").unwrap().values()[0],
            Value::DateTime(month_first)
        );
    }

    #[test]
    fn strict_conversions_report_row() {
        let opts = CleanOptions {
            convert_to_float: vec!["qty".into()],
            ..options()
        };
        let err = clean(&raw(), &opts).unwrap_err();
        assert!(matches!(err, TableError::Conversion { row: 2, .. }));
    }

    #[test]
    fn unknown_columns_are_errors() {
        let opts = CleanOptions {
            uppercase_columns: vec!["ghost".into()],
            ..options()
        };
        assert_eq!(
            clean(&raw(), &opts).unwrap_err(),
            TableError::ColumnNotFound("ghost".into())
        );
    }
}
