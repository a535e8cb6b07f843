//! FILENAME: table-engine/src/lib.rs
//! Core entity layer for the headless table engine.
//!
//! This crate holds the substrate the row-model pipeline is built on:
//! - `value`: normalized cell values and caller records
//! - `row`: the row arena and the Row Model triple (rows/flat/by-id)
//! - `state`: the caller-owned, serializable table state
//! - `memo`: one-slot dependency-keyed caches for pipeline stages
//! - `error`: the fatal (setup/lookup) error type
//!
//! Everything here is synchronous and single-threaded by contract: the
//! per-row value cache uses interior mutability and models are meant to be
//! rebuilt within one render pass, not shared across threads.

pub mod error;
pub mod memo;
pub mod row;
pub mod state;
pub mod value;

pub use error::TableError;
pub use memo::Memo;
pub use row::{RowIdx, RowModel, RowNode};
pub use state::{
    ColumnFilter, ColumnId, ColumnPinning, ColumnSort, ExpandedState, PaginationState,
    PinSide, RowId, TableState,
};
pub use value::{CellValue, OrderedFloat, Record};
