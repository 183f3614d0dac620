//! ieso-sync - merge published market report files into PostgreSQL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ieso_common::logging::{init_logging, LogConfig, LogLevel};
use ieso_reports::ReportType;
use ieso_sync::db::{create_pool, DbConfig};
use ieso_sync::sync_report_type;

#[derive(Parser, Debug)]
#[command(name = "ieso-sync")]
#[command(author, version, about = "IESO market report synchronization tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge report files into their target tables
    Sync {
        /// Target schema
        #[arg(short, long, default_value = "ieso")]
        schema: String,

        /// Report type(s) to synchronize, by published name
        #[arg(short = 't', long = "report-type", required = true)]
        report_types: Vec<String>,

        /// Feed root holding one directory per report type; its files are
        /// processed newest-first
        #[arg(long, conflicts_with = "files")]
        dir: Option<PathBuf>,

        /// Explicit report files, processed in the given order
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose && std::env::var("LOG_LEVEL").is_err() {
        log_config.level = LogLevel::Debug;
    }
    log_config.log_file_prefix = "ieso-sync".to_string();
    init_logging(&log_config)?;

    match cli.command {
        Command::Sync {
            schema,
            report_types,
            dir,
            files,
        } => sync(&schema, &report_types, dir.as_deref(), &files).await,
    }
}

async fn sync(
    schema: &str,
    report_types: &[String],
    dir: Option<&Path>,
    files: &[PathBuf],
) -> Result<()> {
    let db_config = DbConfig::from_env().context("loading database configuration")?;
    let pool = create_pool(&db_config).await?;

    for name in report_types {
        let report_type = ReportType::from_name(name).with_context(|| {
            let known: Vec<&str> = ReportType::ALL.iter().map(|ty| ty.as_str()).collect();
            format!(
                "unknown report type '{name}'; supported types: {}",
                known.join(", ")
            )
        })?;

        let batch = match dir {
            Some(root) => list_report_files(root, report_type)?,
            None => files.to_vec(),
        };
        if batch.is_empty() {
            warn!(report_type = %report_type, "no files to synchronize");
            continue;
        }

        let outcome = sync_report_type(&pool, schema, report_type, &batch)
            .await
            .with_context(|| format!("synchronizing {report_type}"))?;

        info!(
            report_type = %report_type,
            files_loaded = outcome.files_loaded,
            rows_staged = outcome.rows_staged,
            skipped = outcome.skipped.len(),
            "report type synchronized"
        );
    }

    Ok(())
}

/// List `<root>/<report-type>/`, newest file first.
fn list_report_files(root: &Path, report_type: ReportType) -> Result<Vec<PathBuf>> {
    let dir = root.join(report_type.as_str());
    let entries = std::fs::read_dir(&dir)
        .with_context(|| format!("listing report directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files.reverse();
    Ok(files)
}
