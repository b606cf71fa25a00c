use crate::domain::models::{DataType, Table, Value};
use sqlx::query_builder::Separated;
use sqlx::{MySql, QueryBuilder};

/// MySQL caps a prepared statement at 65 535 placeholders.
pub const MAX_PLACEHOLDERS: usize = 65_535;
pub const MAX_BATCH_ROWS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Double,
    Boolean,
    DateTime,
    Text,
}

impl SqlType {
    pub fn for_dtype(dtype: DataType) -> Self {
        match dtype {
            DataType::Int => SqlType::BigInt,
            DataType::Float => SqlType::Double,
            DataType::Bool => SqlType::Boolean,
            DataType::DateTime => SqlType::DateTime,
            DataType::Text | DataType::Mixed | DataType::Null => SqlType::Text,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "DATETIME",
            SqlType::Text => "TEXT",
        }
    }
}

pub fn column_types(table: &Table) -> Vec<SqlType> {
    table
        .columns()
        .iter()
        .map(|c| SqlType::for_dtype(c.dtype()))
        .collect()
}

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn create_database_sql(db_name: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(db_name))
}

pub fn drop_table_sql(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table_name))
}

pub fn create_table_sql(table_name: &str, table: &Table) -> String {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .zip(column_types(table))
        .map(|(c, t)| format!("{} {}", quote_identifier(c.name()), t.as_sql()))
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table_name),
        columns.join(", ")
    )
}

pub fn batch_rows(width: usize) -> usize {
    (MAX_PLACEHOLDERS / width.max(1)).clamp(1, MAX_BATCH_ROWS)
}

fn push_cell(b: &mut Separated<'_, '_, MySql, &'static str>, sql_type: SqlType, value: &Value) {
    if value.is_null() {
        b.push_bind(None::<String>);
        return;
    }
    match (sql_type, value) {
        (SqlType::BigInt, Value::Int(i)) => {
            b.push_bind(*i);
        }
        (SqlType::Double, Value::Float(f)) => {
            b.push_bind(*f);
        }
        (SqlType::Double, Value::Int(i)) => {
            b.push_bind(*i as f64);
        }
        (SqlType::Boolean, Value::Bool(v)) => {
            b.push_bind(*v);
        }
        (SqlType::DateTime, Value::DateTime(dt)) => {
            b.push_bind(*dt);
        }
        (_, other) => {
            b.push_bind(other.to_string());
        }
    }
}

/// Builds one multi-row `INSERT` for `rows`.
pub fn insert_query<'args>(
    table_name: &str,
    table: &Table,
    types: &[SqlType],
    rows: &[Vec<&Value>],
) -> QueryBuilder<'args, MySql> {
    let columns: Vec<String> = table
        .column_names()
        .into_iter()
        .map(quote_identifier)
        .collect();
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        quote_identifier(table_name),
        columns.join(", ")
    ));
    builder.push_values(rows, |mut b, row| {
        for (value, sql_type) in row.iter().zip(types) {
            push_cell(&mut b, *sql_type, value);
        }
    });
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            vec!["id".into(), "precio `usd`".into(), "activo".into(), "nota".into()],
            vec![
                vec![Value::Int(1), Value::Float(2.5), Value::Bool(true), Value::text("a")],
                vec![Value::Int(2), Value::Int(3), Value::Null, Value::Int(7)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("ventas"), "`ventas`");
        assert_eq!(quote_identifier("a`b"), "`a``b`");
        assert_eq!(
            create_database_sql("my db"),
            "CREATE DATABASE IF NOT EXISTS `my db`"
        );
        assert_eq!(drop_table_sql("t"), "DROP TABLE IF EXISTS `t`");
    }

    #[test]
    fn create_table_uses_inferred_types() {
        assert_eq!(
            create_table_sql("ventas", &table()),
            "CREATE TABLE `ventas` (`id` BIGINT, `precio ``usd``` DOUBLE, `activo` BOOLEAN, `nota` TEXT)"
        );
    }

    #[test]
    fn batches_respect_placeholder_limit() {
        assert_eq!(batch_rows(1), MAX_BATCH_ROWS);
        assert_eq!(batch_rows(100), 655);
        assert_eq!(batch_rows(70_000), 1);
        assert_eq!(batch_rows(0), MAX_BATCH_ROWS);
    }

    #[test]
    fn insert_has_one_placeholder_per_cell() {
        let table = table();
        let rows: Vec<Vec<&Value>> = table.rows().collect();
        let types = column_types(&table);
        let builder = insert_query("ventas", &table, &types, &rows);
        let sql = builder.sql();
        assert!(sql.starts_with(
            "INSERT INTO `ventas` (`id`, `precio ``usd```, `activo`, `nota`) VALUES ("
        ));
        assert_eq!(sql.matches('?').count(), 8);
    }
}
