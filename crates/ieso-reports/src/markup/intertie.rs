//! Real-time intertie LMP extractor.
//!
//! One `DeliveryDate`/`DeliveryHour` pair at the root; then, per pricing
//! location, five sibling `Components` groups carry the price series
//! (energy LMP, loss price, internal congestion, external congestion, and
//! the net-injection/supply-loss price), each as twelve `IntervalLMP`
//! entries. The first group also carries the interval index. Twelve rows
//! are produced per pricing location.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::{ReportError, Result};
use crate::recordset::{coerce_date, coerce_float, coerce_small, Column, RecordSet};

use super::{element_text, find_all, MARKET_NS as NS};

pub(crate) const COLUMNS: &[&str] = &[
    "ieso_date",
    "ieso_hour",
    "interval",
    "pricing_location",
    "lmp_intertie",
    "loss_price_energy",
    "congestion_price_energy",
    "congestion_price_external",
    "nisl_price",
];

const INTERVALS_PER_HOUR: usize = 12;

/// Target columns of the five component groups, in document order.
const PRICE_COLUMNS: [&str; 5] = [
    "lmp_intertie",
    "loss_price_energy",
    "congestion_price_energy",
    "congestion_price_external",
    "nisl_price",
];

pub(crate) fn extract(path: &Path) -> Result<RecordSet> {
    parse_source(&super::read_source(path)?)
}

fn parse_source(source: &str) -> Result<RecordSet> {
    let document = Document::parse(source)?;
    let root = document.root_element();

    let date = coerce_date("ieso_date", &element_text(root, NS, "DeliveryDate")?, "%Y-%m-%d")?;
    let hour = coerce_small("ieso_hour", &element_text(root, NS, "DeliveryHour")?)?;

    let locations = find_all(root, NS, "IntertieLMPrice");
    let capacity = locations.len() * INTERVALS_PER_HOUR;
    let mut intervals: Vec<Option<i16>> = Vec::with_capacity(capacity);
    let mut names: Vec<Option<String>> = Vec::with_capacity(capacity);
    let mut prices: [Vec<Option<f64>>; 5] =
        std::array::from_fn(|_| Vec::with_capacity(capacity));

    for location in locations {
        let name = element_text(location, NS, "IntertiePLName")?;

        let groups = find_all(location, NS, "Components");
        if groups.len() < PRICE_COLUMNS.len() {
            return Err(ReportError::MissingElement(format!(
                "Components group {} under {name}",
                groups.len() + 1
            )));
        }
        let series: Vec<Vec<Node>> = groups
            .iter()
            .take(PRICE_COLUMNS.len())
            .map(|group| find_all(*group, NS, "IntervalLMP"))
            .collect();

        for index in 0..INTERVALS_PER_HOUR {
            let lead = series[0].get(index).ok_or_else(|| {
                ReportError::MissingElement(format!("IntervalLMP[{}] under {name}", index + 1))
            })?;
            let interval = coerce_small("interval", &element_text(*lead, NS, "Interval")?)?;
            intervals.push(Some(interval));
            names.push(Some(name.clone()));

            for (group_index, column) in PRICE_COLUMNS.iter().enumerate() {
                let entry = series[group_index].get(index).ok_or_else(|| {
                    ReportError::MissingElement(format!(
                        "IntervalLMP[{}] in component group {} under {name}",
                        index + 1,
                        group_index + 1
                    ))
                })?;
                let value = coerce_float(column, &element_text(*entry, NS, "LMP")?)?;
                prices[group_index].push(Some(value));
            }
        }
    }

    let rows = intervals.len();
    let [lmp, loss, congestion, congestion_external, nisl] = prices;
    RecordSet::new(vec![
        Column::date("ieso_date", vec![Some(date); rows]),
        Column::small_int("ieso_hour", vec![Some(hour); rows]),
        Column::small_int("interval", intervals),
        Column::text("pricing_location", names),
        Column::float("lmp_intertie", lmp),
        Column::float("loss_price_energy", loss),
        Column::float("congestion_price_energy", congestion),
        Column::float("congestion_price_external", congestion_external),
        Column::float("nisl_price", nisl),
    ])
}
