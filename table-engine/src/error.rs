//! FILENAME: table-engine/src/error.rs
//! Fatal errors - raised for misconfiguration, never during a pipeline pass.
//!
//! Resolution failures inside a pass (unknown named function, filter on a
//! missing column) are non-fatal by design: the offending criterion is
//! skipped with a diagnostic instead. Only caller programming errors land
//! here.

use thiserror::Error;

/// Errors raised at table construction or by fatal lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A column definition has no explicit id, no accessor key to derive
    /// one from, and no plain-text header. Raised at setup time.
    #[error("column definition has no derivable id (set an id, an accessor key, or a header)")]
    ColumnIdUnresolvable,

    /// Two column definitions resolved to the same id.
    #[error("duplicate column id: {0}")]
    DuplicateColumnId(String),

    /// `RowModel::row` was called with an id not present in the model.
    /// Signals a bug in the caller's row-id scheme.
    #[error("row not found: {0}")]
    RowNotFound(String),
}
