//! Synchronization of IESO market reports into PostgreSQL.
//!
//! One [`pipeline::sync_report_type`] run merges every final report file of
//! one report type into its target table: the target's structure and
//! primary key are introspected ([`schema`]), a staging clone is loaded
//! from the extracted files, and a single upsert moves the staged rows into
//! the target. The whole run executes inside one transaction and is safe to
//! re-run on overlapping file sets.
//!
//! # Example
//!
//! ```no_run
//! use ieso_reports::ReportType;
//! use ieso_sync::{db, sync_report_type};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::create_pool(&db::DbConfig::from_env()?).await?;
//!     let files = vec!["/reports/PUB_RealtimeEnergyLMP_2025050301.csv".into()];
//!     let outcome =
//!         sync_report_type(&pool, "ieso", ReportType::RealtimeEnergyLmp, &files).await?;
//!     println!("{} files loaded", outcome.files_loaded);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod pipeline;
pub mod schema;

pub use error::{SyncError, SyncResult};
pub use pipeline::{sync_report_type, SkipReason, SkippedFile, SyncOutcome};
pub use schema::{table_schema, TableSchema};
