//! Staged merge pipeline.
//!
//! One run synchronizes one report type: a staging table is recreated as a
//! structure-only copy of the target, every final report file is extracted
//! and bulk-appended into it in caller order, then a single upsert moves
//! the staged rows into the target. The whole run executes inside one
//! transaction, so any failure rolls back with nothing applied.
//!
//! Re-running against the same file set is idempotent: the upsert writes
//! every non-key column from the incoming row, so the final state does not
//! depend on whether a key already existed.

use std::fmt;
use std::path::PathBuf;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, info, warn};

use ieso_reports::{ColumnValues, RecordSet, ReportFile, ReportType};

use crate::error::{SyncError, SyncResult};
use crate::schema::{self, sql_ident};

/// Bind-parameter budget per INSERT; staging loads are chunked to stay
/// inside the PostgreSQL protocol limit.
const BIND_LIMIT: usize = 65_535;

/// Summary of one pipeline run.
#[derive(Debug)]
pub struct SyncOutcome {
    pub report_type: ReportType,
    pub files_loaded: usize,
    pub rows_staged: u64,
    pub skipped: Vec<SkippedFile>,
}

/// A file the run did not load, and why.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Filename does not match the publication naming convention.
    InvalidFilename,
    /// Versioned predispatch snapshot; only final reports are merged.
    Versioned(i16),
    /// The type token resolves to no supported report type.
    UnrecognizedType(String),
    /// The file belongs to a different report type than this run.
    TypeMismatch(ReportType),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidFilename => {
                write!(f, "filename does not match the publication naming convention")
            }
            SkipReason::Versioned(version) => {
                write!(f, "predispatch snapshot v{version} is excluded from the merge")
            }
            SkipReason::UnrecognizedType(token) => {
                write!(f, "no extractor registered for report type '{token}'")
            }
            SkipReason::TypeMismatch(ty) => {
                write!(f, "file belongs to report type {ty}")
            }
        }
    }
}

/// Merge every final report file of `report_type` into
/// `schema_name.<table>` within one transaction.
///
/// Files are processed in the supplied order; when staged rows share a
/// primary key, the last-loaded row wins. The report type is an explicit
/// parameter and is never inferred from the file list, so an empty or
/// fully skipped batch still runs the (no-op) upsert and commits cleanly.
pub async fn sync_report_type(
    pool: &PgPool,
    schema_name: &str,
    report_type: ReportType,
    files: &[PathBuf],
) -> SyncResult<SyncOutcome> {
    let schema_name = sql_ident(schema_name)?;
    let table = sql_ident(&report_type.table_name())?;

    let table_schema = schema::table_schema(pool, &schema_name, &table).await?;
    if table_schema.primary_key.is_empty() {
        return Err(SyncError::MissingPrimaryKey {
            schema: schema_name,
            table,
        });
    }
    let columns = validated(&table_schema.columns)?;
    let primary_key = validated(&table_schema.primary_key)?;
    for column in report_type.output_columns() {
        if !columns.iter().any(|c| c == column) {
            return Err(SyncError::UnknownColumn {
                column: column.to_string(),
                schema: schema_name,
                table,
            });
        }
    }

    let staging = format!("temp_{table}");
    info!(
        report_type = %report_type,
        schema = %schema_name,
        files = files.len(),
        "starting staged merge"
    );

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {staging}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE TEMP TABLE {staging} AS SELECT * FROM {schema_name}.{table} LIMIT 0"
    ))
    .execute(&mut *tx)
    .await?;

    let mut outcome = SyncOutcome {
        report_type,
        files_loaded: 0,
        rows_staged: 0,
        skipped: Vec::new(),
    };

    for path in files {
        let file = ReportFile::new(path.as_path());

        if !file.is_valid() {
            warn!(path = %path.display(), "skipping file outside the naming convention");
            outcome.skipped.push(SkippedFile {
                path: path.clone(),
                reason: SkipReason::InvalidFilename,
            });
            continue;
        }
        if let Some(version) = file.version() {
            debug!(path = %path.display(), version, "skipping predispatch snapshot");
            outcome.skipped.push(SkippedFile {
                path: path.clone(),
                reason: SkipReason::Versioned(version),
            });
            continue;
        }

        match file.report_type() {
            None => {
                warn!(
                    path = %path.display(),
                    token = file.raw_type(),
                    "no extractor registered for report type"
                );
                outcome.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: SkipReason::UnrecognizedType(file.raw_type().to_string()),
                });
            }
            Some(ty) if ty != report_type => {
                warn!(
                    path = %path.display(),
                    found = %ty,
                    expected = %report_type,
                    "file belongs to a different report type"
                );
                outcome.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: SkipReason::TypeMismatch(ty),
                });
            }
            Some(ty) => {
                let records = ty.extract(&file)?;
                debug!(path = %path.display(), rows = records.len(), "staging report rows");
                outcome.rows_staged += stage_records(&mut tx, &staging, &records).await?;
                outcome.files_loaded += 1;
            }
        }
    }

    let upsert = upsert_sql(&schema_name, &table, &staging, &columns, &primary_key);
    sqlx::query(&upsert).execute(&mut *tx).await?;
    tx.commit().await?;

    info!(
        report_type = %report_type,
        files_loaded = outcome.files_loaded,
        rows_staged = outcome.rows_staged,
        skipped = outcome.skipped.len(),
        "merge committed"
    );

    Ok(outcome)
}

fn validated(idents: &[String]) -> SyncResult<Vec<String>> {
    idents.iter().map(|ident| sql_ident(ident)).collect()
}

/// Bulk-append one record set into the staging table, chunked to stay
/// inside the bind-parameter budget.
async fn stage_records(
    tx: &mut Transaction<'_, Postgres>,
    staging: &str,
    records: &RecordSet,
) -> SyncResult<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let column_list = records.column_names().join(", ");
    let rows_per_chunk = (BIND_LIMIT / records.columns().len()).max(1);

    let mut total = 0u64;
    let mut start = 0;
    while start < records.len() {
        let end = (start + rows_per_chunk).min(records.len());

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {staging} ({column_list}) "));
        builder.push_values(start..end, |mut row, index| {
            for column in records.columns() {
                match column.values() {
                    ColumnValues::Date(cells) => {
                        row.push_bind(cells[index]);
                    }
                    ColumnValues::SmallInt(cells) => {
                        row.push_bind(cells[index]);
                    }
                    ColumnValues::Int(cells) => {
                        row.push_bind(cells[index]);
                    }
                    ColumnValues::Float(cells) => {
                        row.push_bind(cells[index]);
                    }
                    ColumnValues::Text(cells) => {
                        row.push_bind(cells[index].clone());
                    }
                    ColumnValues::Timestamp(cells) => {
                        row.push_bind(cells[index]);
                    }
                }
            }
        });

        let result = builder.build().execute(&mut **tx).await?;
        total += result.rows_affected();
        start = end;
    }

    Ok(total)
}

/// Build the single upsert moving staged rows into the target.
///
/// Staging may hold several rows per key (one per overlapping file);
/// `DISTINCT ON` keeps the last-loaded one. Staging is append-only within
/// the transaction, so ctid order matches load order. When every column is
/// part of the key there is nothing to overwrite and conflicts are ignored.
fn upsert_sql(
    schema_name: &str,
    table: &str,
    staging: &str,
    columns: &[String],
    primary_key: &[String],
) -> String {
    let column_list = columns.join(", ");
    let key_list = primary_key.join(", ");

    let assignments: Vec<String> = columns
        .iter()
        .filter(|column| !primary_key.contains(column))
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();
    let conflict_action = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    format!(
        "INSERT INTO {schema_name}.{table} ({column_list}) \
         SELECT DISTINCT ON ({key_list}) {column_list} FROM {staging} \
         ORDER BY {key_list}, ctid DESC \
         ON CONFLICT ({key_list}) {conflict_action}"
    )
}
