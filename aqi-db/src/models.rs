//! Query result model structs.

use chrono::NaiveDateTime;
use serde::Serialize;

/// What the feature store currently holds.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreSummary {
    /// Total stored rows.
    pub rows: usize,
    /// Rows with a reference severity index (usable for training).
    pub labelled_rows: usize,
    /// Earliest stored timestamp, if any.
    pub first: Option<NaiveDateTime>,
    /// Latest stored timestamp, if any.
    pub last: Option<NaiveDateTime>,
}
