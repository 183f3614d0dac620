//! Extractors for the XML report family.
//!
//! Each report type is a distinct namespace-scoped traversal; the shared
//! surface here is limited to element lookup and text extraction. The
//! intertie and zonal price reports declare the market namespace, the
//! generator output report declares the legacy operator namespace.

pub(crate) mod generation;
pub(crate) mod intertie;
pub(crate) mod zonal;

use std::path::Path;

use roxmltree::Node;

use crate::error::{ReportError, Result};

/// Namespace declared by the intertie and zonal price reports.
pub(crate) const MARKET_NS: &str = "http://www.ieso.ca/schema";

/// Namespace declared by the generator output and capability report.
pub(crate) const GENERATION_NS: &str = "http://www.theIMO.com/schema";

pub(crate) fn read_source(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "parsing markup report");
    std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// First descendant element with the given namespaced name.
pub(crate) fn find<'a, 'input>(
    scope: Node<'a, 'input>,
    ns: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    scope
        .descendants()
        .find(|n| n.is_element() && n.has_tag_name((ns, name)))
}

/// All descendant elements with the given namespaced name, in document order.
pub(crate) fn find_all<'a, 'input>(
    scope: Node<'a, 'input>,
    ns: &str,
    name: &str,
) -> Vec<Node<'a, 'input>> {
    scope
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name((ns, name)))
        .collect()
}

/// Trimmed text content of a required descendant element.
pub(crate) fn element_text(scope: Node<'_, '_>, ns: &str, name: &str) -> Result<String> {
    let node = find(scope, ns, name).ok_or_else(|| ReportError::MissingElement(name.to_string()))?;
    Ok(text_of(node))
}

/// Trimmed text content of an element; empty if the element has none.
pub(crate) fn text_of(node: Node<'_, '_>) -> String {
    node.text().unwrap_or("").trim().to_string()
}
