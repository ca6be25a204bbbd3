//! # Source Locator
//!
//! Finds the markup element corresponding to a (line, column) captured by
//! the preview runtime. Identities go stale the instant unrelated edits
//! shift line numbers, so an exact hit is trusted unconditionally and a
//! bounded fuzzy search absorbs small drifts instead of failing every edit
//! after the first.

use crate::ast::{Document, NodeId};

/// Candidates further than this many lines from the target are ignored.
const LINE_WINDOW: u32 = 2;

/// Per-line weight; large enough that any same-line candidate always beats
/// any different-line candidate.
const LINE_WEIGHT: u32 = 100;

/// Locate the element at (or nearest to) a 1-indexed line / 0-indexed
/// column.
///
/// - An exact line+column match short-circuits the traversal and wins.
/// - Otherwise the minimum-distance candidate within the window wins;
///   same-line candidates score `|Δcolumn|`, near-line candidates score
///   `LINE_WEIGHT·|Δline| + |Δcolumn|`.
/// - Ties go to the first candidate in document order.
/// - `None` only when nothing falls inside the window.
pub fn find_element_by_location(doc: &Document, line: u32, column: u32) -> Option<NodeId> {
    let mut best: Option<(u32, NodeId)> = None;

    for element in doc.elements() {
        if element.line == line && element.column == column {
            return Some(element.id);
        }

        let line_delta = element.line.abs_diff(line);
        if line_delta > LINE_WINDOW {
            continue;
        }

        let column_delta = element.column.abs_diff(column);
        let distance = LINE_WEIGHT * line_delta + column_delta;

        // Strict comparison keeps the first-found candidate on ties.
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, element.id));
        }
    }

    best.map(|(_, id)| id)
}
