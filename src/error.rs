use thiserror::Error;

/// Errors the transformer itself can raise. Row indices are zero-based over
/// the data rows of one staged file (the header row is not counted).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// `order_date` did not match the expected `YYYY-MM-DD` pattern.
    /// Row-level: isolated or fatal depending on the configured policy.
    #[error("row {row}: unparsable order_date {value:?} (expected YYYY-MM-DD)")]
    DateParse { row: usize, value: String },

    /// Row shape disagrees with the fixed sales schema. Always fatal for the
    /// whole run; there is no row-level recovery from a structural violation.
    #[error("row {row}: expected {expected} fields, found {found}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Guard for the profit-margin division. The filter makes this
    /// unreachable, but the kernel must stay safe if its steps are reordered.
    #[error("row {row}: sales is zero, cannot compute profit margin")]
    ZeroSales { row: usize },
}

impl TransformError {
    /// Whether the configured date policy may downgrade this to a skip.
    pub fn is_row_level(&self) -> bool {
        matches!(self, TransformError::DateParse { .. })
    }
}
