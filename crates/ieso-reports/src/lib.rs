//! Classification and extraction of IESO market-report files.
//!
//! The publication feed delivers two physical families of reports:
//!
//! - **Delimited text**: six LMP report types sharing one layout, a
//!   non-tabular metadata line followed by a conventional header + data
//!   table.
//! - **Namespace-scoped XML**: intertie LMP, realtime and day-ahead Ontario
//!   zonal prices, and generator output/capability, each with its own
//!   traversal shape.
//!
//! [`ReportFile`] classifies a file from its name alone; [`ReportType`] is
//! the closed set of supported types and dispatches to the matching
//! extractor, producing a columnar [`RecordSet`] ready for bulk loading.
//!
//! # Example
//!
//! ```no_run
//! use ieso_reports::ReportFile;
//!
//! fn rows_in(path: &str) -> ieso_reports::Result<usize> {
//!     let file = ReportFile::new(path);
//!     Ok(file.parse()?.len())
//! }
//! ```

pub mod error;
pub mod identity;
mod markup;
pub mod recordset;
mod tabular;

pub use error::{ReportError, Result};
pub use identity::{Confidentiality, ReportFile, ReportType};
pub use recordset::{Column, ColumnValues, RecordSet};
