//! Extractor for the delimited-text report family.
//!
//! All six LMP report types share one physical layout:
//!
//! ```text
//! CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
//! Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
//! 1,RICHVIEW,24.36,1.12,-0.25
//! ```
//!
//! Line one is a metadata line, not part of the table: the creation
//! timestamp sits at whitespace-token offsets 2-3 and the delivery date is
//! the final token. The header + data table starts on line two. Each type
//! maps its source headers onto target columns; unmapped source columns are
//! dropped. Every record set gains the delivery date as `ieso_date`, and
//! predispatch variants additionally gain `version` and `file_creation_dt`.

use std::fs;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ReportError, Result};
use crate::identity::{ReportFile, ReportType};
use crate::recordset::{coerce_float, coerce_small, nullable, Column, RecordSet};

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    SmallInt,
    Float,
    Text,
}

/// One source header mapped onto a target column.
struct FieldMap {
    header: &'static str,
    column: &'static str,
    kind: FieldKind,
}

const fn field(header: &'static str, column: &'static str, kind: FieldKind) -> FieldMap {
    FieldMap {
        header,
        column,
        kind,
    }
}

const ENERGY_FIELDS: &[FieldMap] = &[
    field("Delivery Hour", "ieso_hour", FieldKind::SmallInt),
    field("Pricing Location", "pricing_location", FieldKind::Text),
    field("LMP", "lmp_energy", FieldKind::Float),
    field("Energy Loss Price", "loss_price_energy", FieldKind::Float),
    field(
        "Energy Congestion Price",
        "congestion_price_energy",
        FieldKind::Float,
    ),
];

const REALTIME_ENERGY_FIELDS: &[FieldMap] = &[
    field("Delivery Hour", "ieso_hour", FieldKind::SmallInt),
    field("Interval", "interval", FieldKind::SmallInt),
    field("Pricing Location", "pricing_location", FieldKind::Text),
    field("LMP", "lmp_energy", FieldKind::Float),
    field("Energy Loss Price", "loss_price_energy", FieldKind::Float),
    field(
        "Energy Congestion Price",
        "congestion_price_energy",
        FieldKind::Float,
    ),
];

const RESERVE_FIELDS: &[FieldMap] = &[
    field("Delivery Hour", "ieso_hour", FieldKind::SmallInt),
    field("Pricing Location", "pricing_location", FieldKind::Text),
    field("LMP 10S", "lmp_10s", FieldKind::Float),
    field("Congestion Price 10S", "congestion_price_10s", FieldKind::Float),
    field("LMP 10N", "lmp_10n", FieldKind::Float),
    field("Congestion Price 10N", "congestion_price_10n", FieldKind::Float),
    field("LMP 30R", "lmp_30r", FieldKind::Float),
    field("Congestion Price 30R", "congestion_price_30r", FieldKind::Float),
];

const REALTIME_RESERVE_FIELDS: &[FieldMap] = &[
    field("Delivery Hour", "ieso_hour", FieldKind::SmallInt),
    field("Interval", "interval", FieldKind::SmallInt),
    field("Pricing Location", "pricing_location", FieldKind::Text),
    field("LMP 10S", "lmp_10s", FieldKind::Float),
    field("Congestion Price 10S", "congestion_price_10s", FieldKind::Float),
    field("LMP 10N", "lmp_10n", FieldKind::Float),
    field("Congestion Price 10N", "congestion_price_10n", FieldKind::Float),
    field("LMP 30R", "lmp_30r", FieldKind::Float),
    field("Congestion Price 30R", "congestion_price_30r", FieldKind::Float),
];

fn fields_for(ty: ReportType) -> Option<&'static [FieldMap]> {
    match ty {
        ReportType::DaHourlyEnergyLmp | ReportType::PredispHourlyEnergyLmp => Some(ENERGY_FIELDS),
        ReportType::RealtimeEnergyLmp => Some(REALTIME_ENERGY_FIELDS),
        ReportType::DaHourlyOrLmp | ReportType::PredispHourlyOrLmp => Some(RESERVE_FIELDS),
        ReportType::RealtimeOrLmp => Some(REALTIME_RESERVE_FIELDS),
        _ => None,
    }
}

/// Column names emitted for a delimited report type, in output order.
pub(crate) fn output_columns(ty: ReportType) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = fields_for(ty)
        .unwrap_or(&[])
        .iter()
        .map(|f| f.column)
        .collect();
    if !columns.is_empty() {
        columns.push("ieso_date");
        if ty.is_predispatch() {
            columns.push("version");
            columns.push("file_creation_dt");
        }
    }
    columns
}

pub(crate) fn extract(ty: ReportType, file: &ReportFile) -> Result<RecordSet> {
    tracing::debug!(path = %file.path().display(), report_type = %ty, "parsing delimited report");
    let content = fs::read_to_string(file.path()).map_err(|source| ReportError::Io {
        path: file.path().to_path_buf(),
        source,
    })?;
    parse_content(ty, &content, file.version())
}

struct TableMetadata {
    delivery_date: NaiveDate,
    created_at: NaiveDateTime,
}

fn parse_metadata_line(line: &str) -> Result<TableMetadata> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (stamp_date, stamp_time, delivery) = match (tokens.get(2), tokens.get(3), tokens.last()) {
        (Some(date), Some(time), Some(last)) if tokens.len() >= 5 => (*date, *time, *last),
        _ => {
            return Err(ReportError::Metadata {
                line: line.to_string(),
                reason: "expected `CREATED AT <timestamp> FOR <date>`".to_string(),
            })
        }
    };

    let created_at =
        NaiveDateTime::parse_from_str(&format!("{stamp_date} {stamp_time}"), TIMESTAMP_FORMAT)
            .map_err(|_| ReportError::Metadata {
                line: line.to_string(),
                reason: format!("creation timestamp does not match {TIMESTAMP_FORMAT}"),
            })?;
    let delivery_date =
        NaiveDate::parse_from_str(delivery, DATE_FORMAT).map_err(|_| ReportError::Metadata {
            line: line.to_string(),
            reason: format!("delivery date does not match {DATE_FORMAT}"),
        })?;

    Ok(TableMetadata {
        delivery_date,
        created_at,
    })
}

enum CellBuffer {
    SmallInt(Vec<Option<i16>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl CellBuffer {
    fn new(kind: FieldKind) -> Self {
        match kind {
            FieldKind::SmallInt => CellBuffer::SmallInt(Vec::new()),
            FieldKind::Float => CellBuffer::Float(Vec::new()),
            FieldKind::Text => CellBuffer::Text(Vec::new()),
        }
    }

    fn push(&mut self, field: &str, raw: &str) -> Result<()> {
        match self {
            CellBuffer::SmallInt(cells) => {
                cells.push(nullable(raw, |s| coerce_small(field, s))?);
            }
            CellBuffer::Float(cells) => {
                cells.push(nullable(raw, |s| coerce_float(field, s))?);
            }
            CellBuffer::Text(cells) => {
                let trimmed = raw.trim();
                cells.push((!trimmed.is_empty()).then(|| trimmed.to_string()));
            }
        }
        Ok(())
    }

    fn into_column(self, name: &str) -> Column {
        match self {
            CellBuffer::SmallInt(cells) => Column::small_int(name, cells),
            CellBuffer::Float(cells) => Column::float(name, cells),
            CellBuffer::Text(cells) => Column::text(name, cells),
        }
    }
}

fn parse_content(ty: ReportType, content: &str, version: Option<i16>) -> Result<RecordSet> {
    let fields = fields_for(ty)
        .ok_or_else(|| ReportError::UnknownReportType(ty.as_str().to_string()))?;

    let (first_line, table) = content.split_once('\n').ok_or_else(|| ReportError::Metadata {
        line: content.trim_end().to_string(),
        reason: "report has no table after the metadata line".to_string(),
    })?;
    let metadata = parse_metadata_line(first_line.trim_end_matches('\r'))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(table.as_bytes());
    let headers = reader.headers()?.clone();

    let mut positions = Vec::with_capacity(fields.len());
    for field in fields {
        let index = headers
            .iter()
            .position(|h| h.trim() == field.header)
            .ok_or_else(|| ReportError::MissingColumn(field.header.to_string()))?;
        positions.push(index);
    }

    let mut buffers: Vec<CellBuffer> = fields.iter().map(|f| CellBuffer::new(f.kind)).collect();
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        for ((field, &index), buffer) in fields.iter().zip(&positions).zip(buffers.iter_mut()) {
            buffer.push(field.column, record.get(index).unwrap_or(""))?;
        }
        rows += 1;
    }

    let mut columns: Vec<Column> = fields
        .iter()
        .zip(buffers)
        .map(|(field, buffer)| buffer.into_column(field.column))
        .collect();
    columns.push(Column::date(
        "ieso_date",
        vec![Some(metadata.delivery_date); rows],
    ));
    if ty.is_predispatch() {
        columns.push(Column::small_int("version", vec![version; rows]));
        columns.push(Column::timestamp(
            "file_creation_dt",
            vec![Some(metadata.created_at); rows],
        ));
    }

    RecordSet::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recordset::ColumnValues;
    use chrono::NaiveDate;

    const ENERGY_REPORT: &str = "\
CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,24.36,1.12,-0.25
2,RICHVIEW,25.10,1.08,0.00
";

    const REALTIME_ENERGY_REPORT: &str = "\
CREATED AT 2025/05/03 08:05:02 FOR 2025/05/03
Delivery Hour,Interval,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
8,1,RICHVIEW,21.00,0.90,0.10
8,2,RICHVIEW,22.50,0.95,0.12
";

    const RESERVE_REPORT: &str = "\
CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
Delivery Hour,Pricing Location,LMP 10S,Congestion Price 10S,LMP 10N,Congestion Price 10N,LMP 30R,Congestion Price 30R
1,RICHVIEW,1.25,0.00,1.10,0.00,0.75,0.00
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn float_column(set: &RecordSet, name: &str) -> Vec<Option<f64>> {
        let column = set
            .columns()
            .iter()
            .find(|c| c.name() == name)
            .unwrap_or_else(|| panic!("missing column {name}"));
        match column.values() {
            ColumnValues::Float(cells) => cells.clone(),
            other => panic!("{name} is not a float column: {other:?}"),
        }
    }

    #[test]
    fn parses_day_ahead_energy_report() {
        let set = parse_content(ReportType::DaHourlyEnergyLmp, ENERGY_REPORT, None).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.column_names(),
            vec![
                "ieso_hour",
                "pricing_location",
                "lmp_energy",
                "loss_price_energy",
                "congestion_price_energy",
                "ieso_date",
            ]
        );
        assert_eq!(float_column(&set, "lmp_energy"), vec![Some(24.36), Some(25.10)]);

        let ieso_date = set.columns().iter().find(|c| c.name() == "ieso_date").unwrap();
        match ieso_date.values() {
            ColumnValues::Date(cells) => {
                assert_eq!(cells, &vec![Some(date(2025, 5, 3)); 2]);
            }
            other => panic!("ieso_date is not a date column: {other:?}"),
        }
    }

    #[test]
    fn realtime_variant_carries_the_interval_column() {
        let set =
            parse_content(ReportType::RealtimeEnergyLmp, REALTIME_ENERGY_REPORT, None).unwrap();
        assert_eq!(set.len(), 2);
        let interval = set.columns().iter().find(|c| c.name() == "interval").unwrap();
        match interval.values() {
            ColumnValues::SmallInt(cells) => assert_eq!(cells, &vec![Some(1), Some(2)]),
            other => panic!("interval is not a smallint column: {other:?}"),
        }
    }

    #[test]
    fn reserve_variant_maps_all_three_classes() {
        let set = parse_content(ReportType::DaHourlyOrLmp, RESERVE_REPORT, None).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(float_column(&set, "lmp_10s"), vec![Some(1.25)]);
        assert_eq!(float_column(&set, "lmp_30r"), vec![Some(0.75)]);
    }

    #[test]
    fn predispatch_variant_gains_version_and_creation_columns() {
        let set = parse_content(ReportType::PredispHourlyEnergyLmp, ENERGY_REPORT, Some(3)).unwrap();
        assert_eq!(
            set.column_names(),
            vec![
                "ieso_hour",
                "pricing_location",
                "lmp_energy",
                "loss_price_energy",
                "congestion_price_energy",
                "ieso_date",
                "version",
                "file_creation_dt",
            ]
        );
        let version = set.columns().iter().find(|c| c.name() == "version").unwrap();
        match version.values() {
            ColumnValues::SmallInt(cells) => assert_eq!(cells, &vec![Some(3); 2]),
            other => panic!("version is not a smallint column: {other:?}"),
        }
        let created = set
            .columns()
            .iter()
            .find(|c| c.name() == "file_creation_dt")
            .unwrap();
        match created.values() {
            ColumnValues::Timestamp(cells) => {
                let expected = date(2025, 5, 2).and_hms_opt(12, 31, 13).unwrap();
                assert_eq!(cells, &vec![Some(expected); 2]);
            }
            other => panic!("file_creation_dt is not a timestamp column: {other:?}"),
        }
    }

    #[test]
    fn final_variant_omits_version_and_creation_columns() {
        let set = parse_content(ReportType::DaHourlyEnergyLmp, ENERGY_REPORT, None).unwrap();
        assert!(!set.column_names().contains(&"version"));
        assert!(!set.column_names().contains(&"file_creation_dt"));
    }

    #[test]
    fn column_set_depends_only_on_the_report_type() {
        let other = "\
CREATED AT 2025/06/01 09:00:00 FOR 2025/06/02
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
5,NANTICOKE,30.00,2.00,1.00
";
        let a = parse_content(ReportType::DaHourlyEnergyLmp, ENERGY_REPORT, None).unwrap();
        let b = parse_content(ReportType::DaHourlyEnergyLmp, other, None).unwrap();
        assert_eq!(a.column_names(), b.column_names());
        assert_eq!(
            a.column_names(),
            ReportType::DaHourlyEnergyLmp.output_columns()
        );
    }

    #[test]
    fn garbled_metadata_line_is_a_hard_failure() {
        let content = "\
just some text
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,24.36,1.12,-0.25
";
        let err = parse_content(ReportType::DaHourlyEnergyLmp, content, None).unwrap_err();
        assert!(matches!(err, ReportError::Metadata { .. }), "{err}");
    }

    #[test]
    fn bad_delivery_date_is_a_hard_failure() {
        let content = "\
CREATED AT 2025/05/02 12:31:13 FOR 03-05-2025
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,24.36,1.12,-0.25
";
        let err = parse_content(ReportType::DaHourlyEnergyLmp, content, None).unwrap_err();
        assert!(matches!(err, ReportError::Metadata { .. }), "{err}");
    }

    #[test]
    fn missing_mapped_header_is_a_hard_failure() {
        let content = "\
CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
Delivery Hour,Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,24.36,1.12,-0.25
";
        let err = parse_content(ReportType::DaHourlyEnergyLmp, content, None).unwrap_err();
        match err {
            ReportError::MissingColumn(name) => assert_eq!(name, "Pricing Location"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_price_is_a_coercion_failure() {
        let content = "\
CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,n/a,1.12,-0.25
";
        let err = parse_content(ReportType::DaHourlyEnergyLmp, content, None).unwrap_err();
        match err {
            ReportError::Coercion { field, .. } => assert_eq!(field, "lmp_energy"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_cells_become_null() {
        let content = "\
CREATED AT 2025/05/02 12:31:13 FOR 2025/05/03
Delivery Hour,Pricing Location,LMP,Energy Loss Price,Energy Congestion Price
1,RICHVIEW,,1.12,-0.25
";
        let set = parse_content(ReportType::DaHourlyEnergyLmp, content, None).unwrap();
        assert_eq!(float_column(&set, "lmp_energy"), vec![None]);
    }

    #[test]
    fn extracts_from_a_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PUB_DAHourlyEnergyLMP_20250503.csv");
        std::fs::write(&path, ENERGY_REPORT).unwrap();

        let file = ReportFile::new(&path);
        let set = file.parse().unwrap();
        assert_eq!(set.len(), 2);
    }
}
