//! Generator output and capability extractor.
//!
//! One `Date` at the root; then, per `Generator` node, three independently
//! indexed sibling series: `Outputs/Output`, `Capabilities/Capability` and
//! `Capacities/AvailCapacity`, each entry holding an `EnergyMW` value. The
//! hour count follows the output series; the sibling series may be shorter,
//! and a missing entry yields a null cell rather than a failure.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::Result;
use crate::recordset::{coerce_date, coerce_int, Column, RecordSet};

use super::{element_text, find, find_all, text_of, GENERATION_NS as NS};

pub(crate) const COLUMNS: &[&str] = &[
    "ieso_date",
    "ieso_hour",
    "generator",
    "fuel_type",
    "output",
    "capability",
    "capacity",
];

pub(crate) fn extract(path: &Path) -> Result<RecordSet> {
    parse_source(&super::read_source(path)?)
}

fn indexed_series<'a, 'input>(
    generator: Node<'a, 'input>,
    group: &str,
    entry: &str,
) -> Vec<Node<'a, 'input>> {
    match find(generator, NS, group) {
        Some(node) => find_all(node, NS, entry),
        None => Vec::new(),
    }
}

fn series_value(entries: &[Node], index: usize, field: &str) -> Result<Option<i32>> {
    let Some(entry) = entries.get(index) else {
        return Ok(None);
    };
    match find(*entry, NS, "EnergyMW") {
        Some(node) => {
            let raw = text_of(node);
            if raw.is_empty() {
                Ok(None)
            } else {
                coerce_int(field, &raw).map(Some)
            }
        }
        None => Ok(None),
    }
}

fn parse_source(source: &str) -> Result<RecordSet> {
    let document = Document::parse(source)?;
    let root = document.root_element();

    let date = coerce_date("ieso_date", &element_text(root, NS, "Date")?, "%Y-%m-%d")?;

    let mut hours: Vec<Option<i16>> = Vec::new();
    let mut names: Vec<Option<String>> = Vec::new();
    let mut fuels: Vec<Option<String>> = Vec::new();
    let mut outputs: Vec<Option<i32>> = Vec::new();
    let mut capabilities: Vec<Option<i32>> = Vec::new();
    let mut capacities: Vec<Option<i32>> = Vec::new();

    for generator in find_all(root, NS, "Generator") {
        let name = element_text(generator, NS, "GeneratorName")?;
        let fuel = element_text(generator, NS, "FuelType")?;

        let output_entries = indexed_series(generator, "Outputs", "Output");
        let capability_entries = indexed_series(generator, "Capabilities", "Capability");
        let capacity_entries = indexed_series(generator, "Capacities", "AvailCapacity");

        // The output series defines the hour count for this generator.
        for index in 0..output_entries.len() {
            hours.push(Some((index + 1) as i16));
            names.push(Some(name.clone()));
            fuels.push(Some(fuel.clone()));
            outputs.push(series_value(&output_entries, index, "output")?);
            capabilities.push(series_value(&capability_entries, index, "capability")?);
            capacities.push(series_value(&capacity_entries, index, "capacity")?);
        }
    }

    let rows = hours.len();
    RecordSet::new(vec![
        Column::date("ieso_date", vec![Some(date); rows]),
        Column::small_int("ieso_hour", hours),
        Column::text("generator", names),
        Column::text("fuel_type", fuels),
        Column::int("output", outputs),
        Column::int("capability", capabilities),
        Column::int("capacity", capacities),
    ])
}
