//! Merging of row sets produced by successive templates.
//!
//! Policy, in order:
//! 1. same number of rows on both sides: positional zip (row i with row i)
//! 2. right side non-empty: cross product, left rows outer, right rows inner
//! 3. right side empty: left side unchanged
//!
//! The zip branch assumes both templates describe the same entities in the
//! same order. The cross product keeps every combination when no such
//! correspondence can be assumed. Merging never fails.

use logtab_fsm::RowSet;
use tracing::debug;

/// Outcome of [`correlate`], naming the branch that produced the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    Zipped(RowSet),
    CrossJoined(RowSet),
    /// The right side had no rows; the left side is returned as is.
    Unchanged(RowSet),
}

impl Correlation {
    pub fn rows(&self) -> &RowSet {
        match self {
            Correlation::Zipped(rows)
            | Correlation::CrossJoined(rows)
            | Correlation::Unchanged(rows) => rows,
        }
    }

    pub fn into_rows(self) -> RowSet {
        match self {
            Correlation::Zipped(rows)
            | Correlation::CrossJoined(rows)
            | Correlation::Unchanged(rows) => rows,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Correlation::Zipped(_) => "zipped",
            Correlation::CrossJoined(_) => "cross-joined",
            Correlation::Unchanged(_) => "unchanged",
        }
    }
}

/// Merge `right` into `left`.
pub fn correlate(left: RowSet, right: RowSet) -> Correlation {
    if left.len() == right.len() {
        debug!("Zipping {} rows pairwise", left.len());
        let rows = left
            .into_iter()
            .zip(right)
            .map(|(mut line, row)| {
                line.extend(row);
                line
            })
            .collect();
        Correlation::Zipped(rows)
    } else if !right.is_empty() {
        debug!(
            "Row counts differ ({} vs {}), cross joining",
            left.len(),
            right.len()
        );
        let mut rows = Vec::with_capacity(left.len() * right.len());
        for line in &left {
            for row in &right {
                let mut merged = Vec::with_capacity(line.len() + row.len());
                merged.extend(line.iter().cloned());
                merged.extend(row.iter().cloned());
                rows.push(merged);
            }
        }
        Correlation::CrossJoined(rows)
    } else {
        Correlation::Unchanged(left)
    }
}
