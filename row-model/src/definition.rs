//! FILENAME: row-model/src/definition.rs
//! Table Definition - the caller-supplied configuration.
//!
//! This module contains the types that DESCRIBE a table: column
//! definitions (identity, accessor, capability flags, algorithm
//! selections) and the table-level configuration (row identity, sub-row
//! extraction, manual-stage switches, capability toggles).
//!
//! Definitions are immutable snapshots of caller intent, created once per
//! table instance. The runtime column/row entities are derived from them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use table_engine::{CellValue, Record, TableError};
use crate::aggregation_fns::AggregationFn;
use crate::filter_fns::FilterFn;
use crate::sorting_fns::SortingFn;

// ============================================================================
// ACCESSOR
// ============================================================================

/// Signature of a caller-supplied accessor function.
pub type AccessorFn = Arc<dyn Fn(&Record) -> CellValue + Send + Sync>;

/// How a column reads its value out of a record.
#[derive(Clone)]
pub enum Accessor {
    /// Plain field key.
    Key(String),
    /// Dotted path descending through nested values.
    Path(String),
    /// Caller-supplied function. Columns using this need an explicit id
    /// or a header to derive one from.
    Func(AccessorFn),
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accessor::Key(k) => write!(f, "Key({:?})", k),
            Accessor::Path(p) => write!(f, "Path({:?})", p),
            Accessor::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl Accessor {
    /// Reads the column value from a record.
    pub fn value_of(&self, record: &Record) -> CellValue {
        match self {
            Accessor::Key(key) => record.get(key),
            Accessor::Path(path) => record.get_path(path),
            Accessor::Func(f) => f(record),
        }
    }

    /// The key this accessor can lend as a column id, if any.
    /// Dotted paths derive ids with dots replaced by underscores.
    pub fn derived_id(&self) -> Option<String> {
        match self {
            Accessor::Key(key) => Some(key.clone()),
            Accessor::Path(path) => Some(path.replace('.', "_")),
            Accessor::Func(_) => None,
        }
    }
}

// ============================================================================
// SORT POLICY
// ============================================================================

/// How empty (undefined) values participate in sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortUndefined {
    /// Empty values always sort first, regardless of direction.
    First,
    /// Empty values always sort last, regardless of direction.
    Last,
    /// Two empties tie; a single empty goes through the comparator
    /// (which orders Empty before everything).
    Tiebreak,
}

impl Default for SortUndefined {
    fn default() -> Self {
        SortUndefined::Tiebreak
    }
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

/// The static descriptor of one column (or header group).
///
/// A definition with child `columns` is a header group: it renders as a
/// spanning header band and contributes no data cells of its own.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Explicit id. When absent, derived from the accessor key or header.
    pub id: Option<String>,

    /// How the column reads its value.
    pub accessor: Accessor,

    /// Display header text.
    pub header: Option<String>,

    /// Capability flags.
    pub enable_sorting: bool,
    pub enable_column_filter: bool,
    pub enable_global_filter: bool,
    pub enable_grouping: bool,
    pub enable_hiding: bool,
    pub enable_pinning: bool,
    pub enable_resizing: bool,

    /// Algorithm selections. `Auto` variants are resolved per pipeline
    /// pass by probing row values.
    pub filter_fn: FilterFn,
    pub sorting_fn: SortingFn,
    pub aggregation_fn: AggregationFn,

    /// Empty-value sort policy.
    pub sort_undefined: SortUndefined,

    /// Inverts every comparator result for this column.
    pub invert_sorting: bool,

    /// Sizing, in pixels.
    pub size: f64,
    pub min_size: f64,
    pub max_size: f64,

    /// Child definitions (header groups).
    pub columns: Vec<ColumnDef>,
}

impl ColumnDef {
    /// A column reading a plain record field.
    pub fn new(key: impl Into<String>) -> Self {
        ColumnDef::with_accessor(Accessor::Key(key.into()))
    }

    /// A column reading a dotted path.
    pub fn path(path: impl Into<String>) -> Self {
        ColumnDef::with_accessor(Accessor::Path(path.into()))
    }

    /// A column computed by a caller function. Needs an id or header.
    pub fn func(f: AccessorFn) -> Self {
        ColumnDef::with_accessor(Accessor::Func(f))
    }

    /// A header group spanning child columns.
    pub fn group(header: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        let mut def = ColumnDef::with_accessor(Accessor::Key(String::new()));
        def.header = Some(header.into());
        def.columns = columns;
        def
    }

    fn with_accessor(accessor: Accessor) -> Self {
        ColumnDef {
            id: None,
            accessor,
            header: None,
            enable_sorting: true,
            enable_column_filter: true,
            enable_global_filter: true,
            enable_grouping: true,
            enable_hiding: true,
            enable_pinning: true,
            enable_resizing: true,
            filter_fn: FilterFn::Auto,
            sorting_fn: SortingFn::Auto,
            aggregation_fn: AggregationFn::Auto,
            sort_undefined: SortUndefined::Tiebreak,
            invert_sorting: false,
            size: 150.0,
            min_size: 20.0,
            max_size: 500.0,
            columns: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Builder helpers
    // ------------------------------------------------------------------------

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_filter_fn(mut self, f: FilterFn) -> Self {
        self.filter_fn = f;
        self
    }

    pub fn with_sorting_fn(mut self, f: SortingFn) -> Self {
        self.sorting_fn = f;
        self
    }

    pub fn with_aggregation_fn(mut self, f: AggregationFn) -> Self {
        self.aggregation_fn = f;
        self
    }

    pub fn with_sort_undefined(mut self, policy: SortUndefined) -> Self {
        self.sort_undefined = policy;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Returns true if this definition is a header group.
    pub fn is_group(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Resolves this definition's id: explicit id, accessor key, or plain
    /// header text, in that order. Fatal when none applies.
    pub fn resolve_id(&self) -> Result<String, TableError> {
        if let Some(id) = &self.id {
            return Ok(id.clone());
        }
        if let Some(id) = self.accessor.derived_id() {
            if !id.is_empty() {
                return Ok(id);
            }
        }
        if let Some(header) = &self.header {
            if !header.is_empty() {
                return Ok(header.clone());
            }
        }
        Err(TableError::ColumnIdUnresolvable)
    }
}

// ============================================================================
// ROW IDENTITY AND SUB-ROWS
// ============================================================================

/// Signature of a caller-supplied row-id function:
/// (record, sibling index, parent id) -> id.
pub type RowIdFn = Arc<dyn Fn(&Record, usize, Option<&str>) -> String + Send + Sync>;

/// How row ids are assigned.
#[derive(Clone)]
pub enum GetRowId {
    /// `parentId.index` composite (the default).
    Index,
    /// Read a record field and use its display string.
    Key(String),
    /// Caller-supplied function.
    Func(RowIdFn),
}

impl std::fmt::Debug for GetRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetRowId::Index => f.write_str("Index"),
            GetRowId::Key(k) => write!(f, "Key({:?})", k),
            GetRowId::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl Default for GetRowId {
    fn default() -> Self {
        GetRowId::Index
    }
}

/// Signature of a caller-supplied sub-row extractor.
pub type SubRowsFn = Arc<dyn Fn(&Record) -> Vec<Record> + Send + Sync>;

/// How hierarchical source data exposes child records.
#[derive(Clone)]
pub enum GetSubRows {
    /// Flat data, no sub-rows (the default).
    None,
    /// A record field holding a list of nested records.
    Key(String),
    /// Caller-supplied function.
    Func(SubRowsFn),
}

impl std::fmt::Debug for GetSubRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetSubRows::None => f.write_str("None"),
            GetSubRows::Key(k) => write!(f, "Key({:?})", k),
            GetSubRows::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl Default for GetSubRows {
    fn default() -> Self {
        GetSubRows::None
    }
}

// ============================================================================
// SELECTION POLICY
// ============================================================================

/// Signature of a caller-supplied per-row selection predicate.
pub type RowPredicateFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Whether rows can be selected.
#[derive(Clone)]
pub enum RowSelectionPolicy {
    Enabled,
    Disabled,
    /// Per-row predicate over the original record.
    Where(RowPredicateFn),
}

impl std::fmt::Debug for RowSelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSelectionPolicy::Enabled => f.write_str("Enabled"),
            RowSelectionPolicy::Disabled => f.write_str("Disabled"),
            RowSelectionPolicy::Where(_) => f.write_str("Where(..)"),
        }
    }
}

impl Default for RowSelectionPolicy {
    fn default() -> Self {
        RowSelectionPolicy::Enabled
    }
}

impl RowSelectionPolicy {
    pub fn allows(&self, record: &Record) -> bool {
        match self {
            RowSelectionPolicy::Enabled => true,
            RowSelectionPolicy::Disabled => false,
            RowSelectionPolicy::Where(f) => f(record),
        }
    }
}

// ============================================================================
// GROUPED COLUMN MODE
// ============================================================================

/// What happens to grouped columns in the visible column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupedColumnMode {
    /// Grouped columns move to the front of the visible order.
    Reorder,
    /// Grouped columns are removed from the visible order.
    Remove,
    /// Leave the order untouched.
    None,
}

impl Default for GroupedColumnMode {
    fn default() -> Self {
        GroupedColumnMode::Reorder
    }
}

// ============================================================================
// TREE FILTERING POLICY
// ============================================================================

/// Which direction tree filtering recurses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeFilterPolicy {
    /// A parent is kept if it passes or any recursively filtered child
    /// survives; recursion stops at `max_leaf_row_filter_depth`.
    RootFirst,
    /// Filtering recurses to leaves first; a parent survives by passing
    /// directly or by retaining at least one surviving child.
    LeafFirst,
}

impl Default for TreeFilterPolicy {
    fn default() -> Self {
        TreeFilterPolicy::RootFirst
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// The complete configuration of a table instance.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Column definitions, possibly a tree of header groups.
    pub columns: Vec<ColumnDef>,

    /// Row identity scheme.
    pub get_row_id: GetRowId,

    /// Sub-row extraction for hierarchical data.
    pub get_sub_rows: GetSubRows,

    /// Manual-stage switches: when set, the stage passes its input
    /// through untouched (the caller does that work server-side).
    pub manual_filtering: bool,
    pub manual_sorting: bool,
    pub manual_grouping: bool,
    pub manual_expanding: bool,
    pub manual_pagination: bool,

    /// Capability toggles.
    pub enable_filters: bool,
    pub enable_sorting: bool,
    pub enable_grouping: bool,
    pub enable_column_resizing: bool,
    pub enable_multi_row_selection: bool,
    pub enable_sub_row_selection: bool,
    pub row_selection: RowSelectionPolicy,

    /// Tree-filter traversal policy.
    pub tree_filter_policy: TreeFilterPolicy,

    /// Depth limit for root-first tree filtering. Children beyond this
    /// depth are kept unfiltered.
    pub max_leaf_row_filter_depth: usize,

    /// When false, expanded descendants paginate as if flattened.
    pub paginate_expanded_rows: bool,

    /// What grouping does to the visible column order.
    pub grouped_column_mode: GroupedColumnMode,

    /// Server-provided totals, for manual pagination.
    pub page_count: Option<usize>,
    pub row_count: Option<usize>,
}

impl TableConfig {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        TableConfig {
            columns,
            get_row_id: GetRowId::Index,
            get_sub_rows: GetSubRows::None,
            manual_filtering: false,
            manual_sorting: false,
            manual_grouping: false,
            manual_expanding: false,
            manual_pagination: false,
            enable_filters: true,
            enable_sorting: true,
            enable_grouping: true,
            enable_column_resizing: true,
            enable_multi_row_selection: true,
            enable_sub_row_selection: true,
            row_selection: RowSelectionPolicy::Enabled,
            tree_filter_policy: TreeFilterPolicy::RootFirst,
            max_leaf_row_filter_depth: 100,
            paginate_expanded_rows: true,
            grouped_column_mode: GroupedColumnMode::Reorder,
            page_count: None,
            row_count: None,
        }
    }
}
