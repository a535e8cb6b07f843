//! FILENAME: row-model/src/lib.rs
//! Headless row-model pipeline over the table entity layer.
//!
//! The pipeline turns raw records into renderable rows through six
//! memoized stages: Core -> Filtered -> Grouped -> Sorted -> Expanded ->
//! Paginated. Selection and the column presentation projections
//! (visibility, order, pinning, sizing, header bands) sit alongside the
//! stages and read the same caller-owned state.
//!
//! Entry point: build a [`Table`] from a [`TableConfig`] and records,
//! mutate state through its setters, and read the stage getters.

pub mod aggregation_fns;
pub mod column;
pub mod core;
pub mod definition;
pub mod expanded;
pub mod filter_fns;
pub mod filtered;
pub mod grouped;
pub mod header;
pub mod paginated;
pub mod selection;
pub mod sorted;
pub mod sorting_fns;
pub mod table;

pub use aggregation_fns::AggregationFn;
pub use column::{Column, ColumnSet};
pub use definition::{
    Accessor, ColumnDef, GetRowId, GetSubRows, GroupedColumnMode, RowSelectionPolicy,
    SortUndefined, TableConfig, TreeFilterPolicy,
};
pub use filter_fns::FilterFn;
pub use header::{Header, HeaderGroup};
pub use selection::SelectionStatus;
pub use sorting_fns::SortingFn;
pub use table::{Cell, ModelRef, Table};
