//! Report file identity: classification of a published file from its name.
//!
//! Feed files are named `<ORIGIN>_<ReportType>_<id>[_v<version>].<ext>`,
//! where ORIGIN is `PUB` for public reports and `CNF` for confidential ones.
//! A `_v<digits>` suffix marks a predispatch snapshot; files without it are
//! final reports. Classification never reads the file contents.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ReportError, Result};
use crate::recordset::RecordSet;
use crate::{markup, tabular};

static NAMING_CONVENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(PUB|CNF)_[A-Za-z0-9]+_\d{4,10}(_v\d+)?$").expect("naming convention regex")
});

/// Confidentiality classification derived from the origin token.
///
/// `Unknown` is a data-quality signal, not a fatal condition; such files
/// also fail the naming convention and are skipped by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidentiality {
    Public,
    Confidential,
    Unknown,
}

/// The closed set of supported report types.
///
/// Extraction is dispatched by exact match on the published type name; an
/// unlisted name is a checked condition ([`ReportError::UnknownReportType`]),
/// never a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    DaHourlyEnergyLmp,
    PredispHourlyEnergyLmp,
    DaHourlyOrLmp,
    PredispHourlyOrLmp,
    RealtimeEnergyLmp,
    RealtimeOrLmp,
    RealtimeIntertieLmp,
    RealtimeOntarioZonalPrice,
    DaHourlyOntarioZonalPrice,
    GenOutputCapability,
}

impl ReportType {
    pub const ALL: [ReportType; 10] = [
        ReportType::DaHourlyEnergyLmp,
        ReportType::PredispHourlyEnergyLmp,
        ReportType::DaHourlyOrLmp,
        ReportType::PredispHourlyOrLmp,
        ReportType::RealtimeEnergyLmp,
        ReportType::RealtimeOrLmp,
        ReportType::RealtimeIntertieLmp,
        ReportType::RealtimeOntarioZonalPrice,
        ReportType::DaHourlyOntarioZonalPrice,
        ReportType::GenOutputCapability,
    ];

    /// The type name as published in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::DaHourlyEnergyLmp => "DAHourlyEnergyLMP",
            ReportType::PredispHourlyEnergyLmp => "PredispHourlyEnergyLMP",
            ReportType::DaHourlyOrLmp => "DAHourlyORLMP",
            ReportType::PredispHourlyOrLmp => "PredispHourlyORLMP",
            ReportType::RealtimeEnergyLmp => "RealtimeEnergyLMP",
            ReportType::RealtimeOrLmp => "RealtimeORLMP",
            ReportType::RealtimeIntertieLmp => "RealTimeIntertieLMP",
            ReportType::RealtimeOntarioZonalPrice => "RealtimeOntarioZonalPrice",
            ReportType::DaHourlyOntarioZonalPrice => "DAHourlyOntarioZonalPrice",
            ReportType::GenOutputCapability => "GenOutputCapability",
        }
    }

    /// Exact-match lookup of a published type name.
    pub fn from_name(name: &str) -> Option<ReportType> {
        Self::ALL.iter().copied().find(|ty| ty.as_str() == name)
    }

    /// Target table name: the lower-cased type name.
    pub fn table_name(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Predispatch variants carry version and creation-time columns.
    pub fn is_predispatch(&self) -> bool {
        matches!(
            self,
            ReportType::PredispHourlyEnergyLmp | ReportType::PredispHourlyOrLmp
        )
    }

    /// Column names this type's extractor emits, in output order.
    pub fn output_columns(&self) -> Vec<&'static str> {
        match self {
            ReportType::DaHourlyEnergyLmp
            | ReportType::PredispHourlyEnergyLmp
            | ReportType::DaHourlyOrLmp
            | ReportType::PredispHourlyOrLmp
            | ReportType::RealtimeEnergyLmp
            | ReportType::RealtimeOrLmp => tabular::output_columns(*self),
            ReportType::RealtimeIntertieLmp => markup::intertie::COLUMNS.to_vec(),
            ReportType::RealtimeOntarioZonalPrice => markup::zonal::REALTIME_COLUMNS.to_vec(),
            ReportType::DaHourlyOntarioZonalPrice => markup::zonal::DAY_AHEAD_COLUMNS.to_vec(),
            ReportType::GenOutputCapability => markup::generation::COLUMNS.to_vec(),
        }
    }

    /// Run the extractor registered for this type against a report file.
    pub fn extract(&self, file: &ReportFile) -> Result<RecordSet> {
        match self {
            ReportType::DaHourlyEnergyLmp
            | ReportType::PredispHourlyEnergyLmp
            | ReportType::DaHourlyOrLmp
            | ReportType::PredispHourlyOrLmp
            | ReportType::RealtimeEnergyLmp
            | ReportType::RealtimeOrLmp => tabular::extract(*self, file),
            ReportType::RealtimeIntertieLmp => markup::intertie::extract(file.path()),
            ReportType::RealtimeOntarioZonalPrice => markup::zonal::extract_realtime(file.path()),
            ReportType::DaHourlyOntarioZonalPrice => markup::zonal::extract_day_ahead(file.path()),
            ReportType::GenOutputCapability => markup::generation::extract(file.path()),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published report file, classified from its filename.
#[derive(Debug, Clone)]
pub struct ReportFile {
    path: PathBuf,
    file_name: String,
    raw_type: String,
    confidentiality: Confidentiality,
    version: Option<i16>,
    valid: bool,
}

impl ReportFile {
    /// Classify a file path. Pure function of the filename; the file itself
    /// is only touched later, by `parse`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or("");

        let valid = NAMING_CONVENTION.is_match(stem);

        let mut segments = stem.split('_');
        let confidentiality = match segments.next() {
            Some("PUB") => Confidentiality::Public,
            Some("CNF") => Confidentiality::Confidential,
            _ => Confidentiality::Unknown,
        };
        let raw_type = segments.next().unwrap_or("").to_string();

        let version = stem
            .rsplit('_')
            .next()
            .and_then(|segment| segment.strip_prefix('v'))
            .and_then(|digits| digits.parse().ok());

        Self {
            path,
            file_name,
            raw_type,
            confidentiality,
            version,
            valid,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The type token from the filename, which may or may not name a
    /// supported [`ReportType`].
    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    pub fn confidentiality(&self) -> Confidentiality {
        self.confidentiality
    }

    /// Snapshot version; `None` for final reports.
    pub fn version(&self) -> Option<i16> {
        self.version
    }

    /// Whether the filename matches the publication naming convention.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether this is a final (non-versioned) report.
    pub fn is_final(&self) -> bool {
        self.version.is_none()
    }

    /// Resolve the type token against the supported set.
    pub fn report_type(&self) -> Option<ReportType> {
        ReportType::from_name(&self.raw_type)
    }

    /// Extract this file with the extractor registered for its type.
    pub fn parse(&self) -> Result<RecordSet> {
        match self.report_type() {
            Some(ty) => ty.extract(self),
            None => Err(ReportError::UnknownReportType(self.raw_type.clone())),
        }
    }
}
