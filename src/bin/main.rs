use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;
use tabular_tools::{
    config::Config,
    domain::{
        audit::detect_sentinel,
        cleaning::{CleanOptions, clean},
        workflow::{RunSummary, load_input, log_summary, render, setup_logging},
    },
    inbound::file::{CsvOptions, Excel, Reader, WorkbookFormat},
    outbound::{file::write_csv, mysql::create_mysql_db},
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tabular_tools", version, about = "Spreadsheet loading, auditing, cleaning and MySQL bulk-load helpers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load named sheets from a workbook and preview them
    Sheets {
        file: PathBuf,
        #[arg(long = "sheet", required = true)]
        sheets: Vec<String>,
        #[arg(long, default_value = "auto")]
        format: WorkbookFormat,
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Count sentinel missing-value markers per column
    Audit {
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        marker: Option<String>,
        #[arg(long, default_value = "auto")]
        format: WorkbookFormat,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Apply cleaning options from a JSON file and write the result as csv
    Clean {
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        options: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "auto")]
        format: WorkbookFormat,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Create a MySQL database and replace a table with a csv file's rows
    LoadMysql {
        csv: PathBuf,
        #[arg(long)]
        database: String,
        #[arg(long)]
        table: String,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character, got '{}'", delimiter);
    }
    Ok(delimiter as u8)
}

async fn run(command: Command, config: &Config) -> anyhow::Result<RunSummary> {
    match command {
        Command::Sheets {
            file,
            sheets,
            format,
            preview,
        } => {
            let loaded = Reader::load_excel(&file, &sheets, format)?;
            info!("Loaded sheets: {}", loaded.names().join(", "));
            let mut rows_in = 0;
            for (name, table) in loaded.iter() {
                rows_in += table.height();
                println!(
                    "{} {} rows x {} columns",
                    name.bold(),
                    table.height(),
                    table.width()
                );
                println!("{}", render::preview(table, preview));
            }
            Ok(RunSummary {
                command: "Sheets",
                tables: loaded.len(),
                rows_in,
                rows_out: 0,
                warnings: Vec::new(),
                total_runtime_secs: 0.0,
            })
        }
        Command::Audit {
            file,
            sheet,
            marker,
            format,
            delimiter,
        } => {
            let csv_options = CsvOptions {
                delimiter: delimiter_byte(delimiter)?,
            };
            let table = load_input(&file, sheet.as_deref(), format, csv_options)?;
            let marker = marker.unwrap_or_else(|| config.sentinel_marker.clone());
            let report = detect_sentinel(&table, &marker);
            let mut warnings = Vec::new();
            if report.is_clean() {
                println!("{}", format!("No '{}' values found", marker).green());
            } else {
                println!("{}", render::sentinel_report(&report));
                for entry in &report.columns {
                    warnings.push(format!(
                        "column '{}' has {} '{}' value(s) ({:.2}%)",
                        entry.column, entry.count, marker, entry.percent
                    ));
                }
            }
            Ok(RunSummary {
                command: "Audit",
                tables: 1,
                rows_in: table.height(),
                rows_out: 0,
                warnings,
                total_runtime_secs: 0.0,
            })
        }
        Command::Clean {
            file,
            sheet,
            options,
            output,
            format,
            delimiter,
        } => {
            let delimiter = delimiter_byte(delimiter)?;
            let clean_options = CleanOptions::from_json_file(&options)?;
            let table = load_input(&file, sheet.as_deref(), format, CsvOptions { delimiter })?;
            let cleaned = clean(&table, &clean_options)
                .with_context(|| format!("failed to clean {}", file.display()))?;
            write_csv(&cleaned, &output, delimiter)?;
            println!(
                "{} wrote {} rows x {} columns to {}",
                "done".green(),
                cleaned.height(),
                cleaned.width(),
                output.display()
            );
            Ok(RunSummary {
                command: "Clean",
                tables: 1,
                rows_in: table.height(),
                rows_out: cleaned.height(),
                warnings: Vec::new(),
                total_runtime_secs: 0.0,
            })
        }
        Command::LoadMysql {
            csv,
            database,
            table,
            host,
            port,
            user,
            password,
        } => {
            let mut settings = config.mysql.clone();
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(user) = user {
                settings.user = user;
            }
            if password.is_some() {
                settings.password = password;
            }
            let mut warnings = Vec::new();
            if settings.user.is_empty() {
                warn!("No MySQL user configured; set MYSQL_USER or pass --user");
                warnings.push("connected without a MySQL user".to_string());
            }
            let report = create_mysql_db(&csv, &database, &table, &settings).await?;
            println!(
                "{} loaded {} rows into {}.{}",
                "done".green(),
                report.rows_inserted,
                report.database,
                report.table
            );
            Ok(RunSummary {
                command: "Load",
                tables: 1,
                rows_in: report.rows_inserted,
                rows_out: report.rows_inserted,
                warnings,
                total_runtime_secs: 0.0,
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config =
        Config::from_env().context("Failed to load configuration from environment variables")?;

    setup_logging(config.log_level, &config.log_dir)?;
    info!("Configuration loaded successfully");

    let start_time = Instant::now();
    let result = run(cli.command, &config).await;
    if let Err(e) = &result {
        eprintln!("{} {:#}", "error:".red(), e);
    }
    let mut summary = result?;
    summary.total_runtime_secs = start_time.elapsed().as_secs_f64();
    log_summary(summary);

    Ok(())
}
