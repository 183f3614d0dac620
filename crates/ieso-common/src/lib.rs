//! Shared infrastructure for the ieso workspace.
//!
//! Currently this is the centralized logging setup used by every workspace
//! binary. Domain code lives in `ieso-reports` (classification and
//! extraction) and `ieso-sync` (database synchronization).

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput};
