//! Ontario zonal price extractors, realtime and day-ahead.
//!
//! The two layouts share a namespace and nothing else. The realtime report
//! repeats three `RealTimePriceComponents` groups (zonal, loss, congestion)
//! whose entries are numbered elements, one per interval; the day-ahead
//! report is a flat list of `HourlyPriceComponents` nodes with the prices
//! as direct siblings.

use std::path::Path;

use roxmltree::Document;

use crate::error::{ReportError, Result};
use crate::recordset::{coerce_date, coerce_float, coerce_small, Column, RecordSet};

use super::{element_text, find, find_all, MARKET_NS as NS};

pub(crate) const REALTIME_COLUMNS: &[&str] = &[
    "ieso_date",
    "ieso_hour",
    "interval",
    "zonal_price",
    "loss_price_energy",
    "congestion_price_energy",
];

pub(crate) const DAY_AHEAD_COLUMNS: &[&str] = &[
    "ieso_date",
    "ieso_hour",
    "zonal_price",
    "loss_price_energy",
    "congestion_price_energy",
];

const INTERVALS_PER_HOUR: usize = 12;

/// Target columns of the three realtime component groups, in document order.
const PRICE_COLUMNS: [&str; 3] = ["zonal_price", "loss_price_energy", "congestion_price_energy"];

pub(crate) fn extract_realtime(path: &Path) -> Result<RecordSet> {
    parse_realtime(&super::read_source(path)?)
}

pub(crate) fn extract_day_ahead(path: &Path) -> Result<RecordSet> {
    parse_day_ahead(&super::read_source(path)?)
}

fn parse_realtime(source: &str) -> Result<RecordSet> {
    let document = Document::parse(source)?;
    let root = document.root_element();

    // The delivery field arrives as "For <date> - Hour <hour>" instead of a
    // plain date. Upstream quirk; tolerated here and nowhere else.
    let delivery = element_text(root, NS, "DeliveryDate")?;
    let tokens: Vec<&str> = delivery.split_whitespace().collect();
    let (date_token, hour_token) = match (tokens.get(1), tokens.last()) {
        (Some(date), Some(hour)) if tokens.len() >= 3 => (*date, *hour),
        _ => {
            return Err(ReportError::Metadata {
                line: delivery.clone(),
                reason: "expected `For <date> - Hour <hour>`".to_string(),
            })
        }
    };
    let date = coerce_date("ieso_date", date_token, "%Y-%m-%d")?;
    let hour = coerce_small("ieso_hour", hour_token)?;

    let groups = find_all(root, NS, "RealTimePriceComponents");
    if groups.len() < PRICE_COLUMNS.len() {
        return Err(ReportError::MissingElement(format!(
            "RealTimePriceComponents group {}",
            groups.len() + 1
        )));
    }

    let mut intervals: Vec<Option<i16>> = Vec::with_capacity(INTERVALS_PER_HOUR);
    let mut prices: [Vec<Option<f64>>; 3] =
        std::array::from_fn(|_| Vec::with_capacity(INTERVALS_PER_HOUR));

    for interval in 1..=INTERVALS_PER_HOUR {
        let wrapper = format!("OntarioZonalPriceInterval{interval}");
        let leaf = format!("Interval{interval}");

        for (group_index, column) in PRICE_COLUMNS.iter().enumerate() {
            let holder = find(groups[group_index], NS, &wrapper).ok_or_else(|| {
                ReportError::MissingElement(format!(
                    "{wrapper} in component group {}",
                    group_index + 1
                ))
            })?;
            let value = coerce_float(column, &element_text(holder, NS, &leaf)?)?;
            prices[group_index].push(Some(value));
        }
        intervals.push(Some(interval as i16));
    }

    let rows = intervals.len();
    let [zonal, loss, congestion] = prices;
    RecordSet::new(vec![
        Column::date("ieso_date", vec![Some(date); rows]),
        Column::small_int("ieso_hour", vec![Some(hour); rows]),
        Column::small_int("interval", intervals),
        Column::float("zonal_price", zonal),
        Column::float("loss_price_energy", loss),
        Column::float("congestion_price_energy", congestion),
    ])
}

fn parse_day_ahead(source: &str) -> Result<RecordSet> {
    let document = Document::parse(source)?;
    let root = document.root_element();

    let date = coerce_date("ieso_date", &element_text(root, NS, "DeliveryDate")?, "%Y-%m-%d")?;

    let nodes = find_all(root, NS, "HourlyPriceComponents");
    let mut hours: Vec<Option<i16>> = Vec::with_capacity(nodes.len());
    let mut zonal: Vec<Option<f64>> = Vec::with_capacity(nodes.len());
    let mut loss: Vec<Option<f64>> = Vec::with_capacity(nodes.len());
    let mut congestion: Vec<Option<f64>> = Vec::with_capacity(nodes.len());

    for node in nodes {
        hours.push(Some(coerce_small(
            "ieso_hour",
            &element_text(node, NS, "PricingHour")?,
        )?));
        zonal.push(Some(coerce_float(
            "zonal_price",
            &element_text(node, NS, "ZonalPrice")?,
        )?));
        loss.push(Some(coerce_float(
            "loss_price_energy",
            &element_text(node, NS, "LossPriceCapped")?,
        )?));
        congestion.push(Some(coerce_float(
            "congestion_price_energy",
            &element_text(node, NS, "CongestionPriceCapped")?,
        )?));
    }

    let rows = hours.len();
    RecordSet::new(vec![
        Column::date("ieso_date", vec![Some(date); rows]),
        Column::small_int("ieso_hour", hours),
        Column::float("zonal_price", zonal),
        Column::float("loss_price_energy", loss),
        Column::float("congestion_price_energy", congestion),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recordset::ColumnValues;
    use chrono::NaiveDate;

    fn realtime_document(delivery: &str, groups: usize, intervals: usize) -> String {
        let mut body = String::new();
        for group in 0..groups {
            let mut entries = String::new();
            for interval in 1..=intervals {
                entries.push_str(&format!(
                    "<OntarioZonalPriceInterval{interval}><Interval{interval}>{}.5</Interval{interval}></OntarioZonalPriceInterval{interval}>",
                    group * 100 + interval
                ));
            }
            body.push_str(&format!(
                "<RealTimePriceComponents>{entries}</RealTimePriceComponents>"
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Document xmlns="http://www.ieso.ca/schema">
<DeliveryDate>{delivery}</DeliveryDate>
{body}
</Document>"#
        )
    }

    #[test]
    fn parses_the_composite_delivery_field() {
        let source = realtime_document("For 2025-07-12 - Hour 21", 3, 12);
        let set = parse_realtime(&source).unwrap();
        assert_eq!(set.len(), 12);
        assert_eq!(set.column_names(), REALTIME_COLUMNS.to_vec());

        let dates = set.columns().iter().find(|c| c.name() == "ieso_date").unwrap();
        match dates.values() {
            ColumnValues::Date(cells) => {
                assert_eq!(cells[0], NaiveDate::from_ymd_opt(2025, 7, 12));
            }
            other => panic!("ieso_date is not a date column: {other:?}"),
        }
        let hours = set.columns().iter().find(|c| c.name() == "ieso_hour").unwrap();
        match hours.values() {
            ColumnValues::SmallInt(cells) => assert_eq!(cells[0], Some(21)),
            other => panic!("ieso_hour is not a smallint column: {other:?}"),
        }
    }

    #[test]
    fn numbered_intervals_feed_the_three_price_columns() {
        let source = realtime_document("For 2025-07-12 - Hour 21", 3, 12);
        let set = parse_realtime(&source).unwrap();

        let cells = |name: &str| {
            let column = set.columns().iter().find(|c| c.name() == name).unwrap();
            match column.values() {
                ColumnValues::Float(cells) => cells.clone(),
                other => panic!("{name} is not a float column: {other:?}"),
            }
        };
        assert_eq!(cells("zonal_price")[0], Some(1.5));
        assert_eq!(cells("loss_price_energy")[0], Some(101.5));
        assert_eq!(cells("congestion_price_energy")[11], Some(212.5));
    }

    #[test]
    fn plain_delivery_date_is_rejected() {
        let source = realtime_document("2025-07-12", 3, 12);
        let err = parse_realtime(&source).unwrap_err();
        assert!(matches!(err, ReportError::Metadata { .. }), "{err}");
    }

    #[test]
    fn missing_component_group_is_a_hard_failure() {
        let source = realtime_document("For 2025-07-12 - Hour 21", 2, 12);
        let err = parse_realtime(&source).unwrap_err();
        assert!(matches!(err, ReportError::MissingElement(_)), "{err}");
    }

    fn day_ahead_document(hours: &[(i16, f64, f64, f64)]) -> String {
        let mut body = String::new();
        for (hour, zonal, loss, congestion) in hours {
            body.push_str(&format!(
                "<HourlyPriceComponents><PricingHour>{hour}</PricingHour>\
                 <ZonalPrice>{zonal}</ZonalPrice>\
                 <LossPriceCapped>{loss}</LossPriceCapped>\
                 <CongestionPriceCapped>{congestion}</CongestionPriceCapped>\
                 </HourlyPriceComponents>"
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Document xmlns="http://www.ieso.ca/schema">
<DeliveryDate>2025-07-13</DeliveryDate>
{body}
</Document>"#
        )
    }

    #[test]
    fn one_row_per_hourly_component_node() {
        let source = day_ahead_document(&[
            (1, 20.0, 1.0, 0.5),
            (2, 21.5, 1.1, 0.6),
            (3, 22.0, 1.2, 0.7),
        ]);
        let set = parse_day_ahead(&source).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.column_names(), DAY_AHEAD_COLUMNS.to_vec());

        let hours = set.columns().iter().find(|c| c.name() == "ieso_hour").unwrap();
        match hours.values() {
            ColumnValues::SmallInt(cells) => {
                assert_eq!(cells, &vec![Some(1), Some(2), Some(3)]);
            }
            other => panic!("ieso_hour is not a smallint column: {other:?}"),
        }
    }

    #[test]
    fn unparseable_price_is_a_coercion_failure() {
        let source = day_ahead_document(&[(1, 20.0, 1.0, 0.5)])
            .replace("<ZonalPrice>20</ZonalPrice>", "<ZonalPrice>n/a</ZonalPrice>");
        let err = parse_day_ahead(&source).unwrap_err();
        match err {
            ReportError::Coercion { field, .. } => assert_eq!(field, "zonal_price"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
