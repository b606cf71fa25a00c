pub mod schema;

use crate::domain::models::{Table, Value};
use crate::inbound::file::{Csv, CsvOptions, EmptyCsv, Reader};
use anyhow::Context;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file '{0}' must have a .csv extension")]
    InvalidExtension(String),

    #[error("csv file '{0}' is empty")]
    EmptyCsv(String),

    #[error("{kind} name must not be empty")]
    EmptyIdentifier { kind: &'static str },
}

#[derive(Debug, Clone)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: None,
        }
    }
}

impl MySqlSettings {
    fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub database: String,
    pub table: String,
    pub rows_inserted: usize,
}

/// Checks the path has a `.csv` extension (case-sensitive) and that the target
/// names are usable.
pub fn validate_request(
    csv_path: &Path,
    db_name: &str,
    table_name: &str,
) -> Result<(), LoadError> {
    let path_str = csv_path.to_string_lossy();
    if !path_str.ends_with(".csv") {
        return Err(LoadError::InvalidExtension(path_str.into_owned()));
    }
    if db_name.trim().is_empty() {
        return Err(LoadError::EmptyIdentifier { kind: "database" });
    }
    if table_name.trim().is_empty() {
        return Err(LoadError::EmptyIdentifier { kind: "table" });
    }
    Ok(())
}

/// Creates `db_name` if needed and replaces `table_name` with the contents of
/// the csv file at `csv_path`.
pub async fn create_mysql_db(
    csv_path: &Path,
    db_name: &str,
    table_name: &str,
    settings: &MySqlSettings,
) -> anyhow::Result<LoadReport> {
    validate_request(csv_path, db_name, table_name)?;
    let table = match Reader::read_csv(csv_path, CsvOptions::default()) {
        Ok(table) => table,
        Err(e) if e.downcast_ref::<EmptyCsv>().is_some() => {
            return Err(LoadError::EmptyCsv(csv_path.display().to_string()).into());
        }
        Err(e) => return Err(e),
    };
    info!(
        "Read {} row(s) x {} column(s) from '{}'",
        table.height(),
        table.width(),
        csv_path.display()
    );

    let result = load_table(&table, db_name, table_name, settings).await;
    match &result {
        Ok(report) => info!(
            "Database '{}' and table '{}' created successfully ({} rows)",
            report.database, report.table, report.rows_inserted
        ),
        Err(e) => error!("Failed to load '{}' into MySQL: {:#}", csv_path.display(), e),
    }
    result
}

async fn load_table(
    table: &Table,
    db_name: &str,
    table_name: &str,
    settings: &MySqlSettings,
) -> anyhow::Result<LoadReport> {
    let server_options = settings.connect_options();
    let mut conn = MySqlConnection::connect_with(&server_options)
        .await
        .with_context(|| {
            format!(
                "failed to connect to MySQL at {}:{}",
                settings.host, settings.port
            )
        })?;
    conn.execute(schema::create_database_sql(db_name).as_str())
        .await
        .with_context(|| format!("failed to create database '{}'", db_name))?;
    conn.close().await.context("failed to close MySQL connection")?;

    let db_options = server_options.database(db_name);
    let mut conn = MySqlConnection::connect_with(&db_options)
        .await
        .with_context(|| format!("failed to connect to MySQL database '{}'", db_name))?;
    conn.execute(schema::drop_table_sql(table_name).as_str())
        .await
        .with_context(|| format!("failed to drop table '{}'", table_name))?;
    let create_sql = schema::create_table_sql(table_name, table);
    debug!("{}", create_sql);
    conn.execute(create_sql.as_str())
        .await
        .with_context(|| format!("failed to create table '{}'", table_name))?;

    let types = schema::column_types(table);
    let rows: Vec<Vec<&Value>> = table.rows().collect();
    let batch = schema::batch_rows(table.width());
    let mut rows_inserted = 0;
    let mut tx = conn.begin().await.context("failed to start transaction")?;
    for chunk in rows.chunks(batch) {
        let mut builder = schema::insert_query(table_name, table, &types, chunk);
        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert rows into '{}'", table_name))?;
        rows_inserted += result.rows_affected() as usize;
        debug!("Inserted {}/{} row(s)", rows_inserted, rows.len());
    }
    tx.commit().await.context("failed to commit inserts")?;
    conn.close().await.context("failed to close MySQL connection")?;

    Ok(LoadReport {
        database: db_name.to_string(),
        table: table_name.to_string(),
        rows_inserted,
    })
}
