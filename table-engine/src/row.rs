//! FILENAME: table-engine/src/row.rs
//! Rows and the Row Model arena.
//!
//! A Row Model is the unit of output of every pipeline stage: an ordered
//! tree of rows plus two derived projections (the pre-order flat sequence
//! and the id -> row index). Rows are stored in a flat arena and reference
//! parents/children by index, so tree stages can rebuild structure without
//! ownership cycles.
//!
//! Invariants, maintained by `finish`:
//! - every row reachable from `top` appears exactly once in `flat`
//! - `by_id` maps every row's id to its arena index
//! - row ids are unique within one model
//!
//! Stages never mutate an input model; they build a new arena that shares
//! the original records via `Arc`.

use std::cell::RefCell;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::TableError;
use crate::state::{ColumnId, RowId};
use crate::value::{CellValue, Record};

/// Index of a row within a model's arena.
pub type RowIdx = usize;

// ============================================================================
// ROW NODE
// ============================================================================

/// One row at one tree depth.
///
/// Group rows produced by the grouping stage have no meaningful original
/// record of their own; they point at their first leaf's record and carry
/// `grouping_column`/`grouping_value` plus per-column aggregates instead.
#[derive(Debug, Clone)]
pub struct RowNode {
    /// Stable identity, unique within the model.
    pub id: RowId,

    /// Index among siblings in the original (pre-pipeline) data.
    pub index: usize,

    /// Tree depth (0 = top level).
    pub depth: usize,

    /// Arena index of the parent row, if any.
    pub parent: Option<RowIdx>,

    /// Arena indices of child rows, in display order.
    pub children: Vec<RowIdx>,

    /// The original record. Shared, never mutated.
    pub original: Arc<Record>,

    /// For group rows: the column this row groups by.
    pub grouping_column: Option<ColumnId>,

    /// For group rows: the shared value of the grouped column.
    pub grouping_value: Option<CellValue>,

    /// For group rows: aggregated values for non-grouped columns.
    pub aggregates: FxHashMap<ColumnId, CellValue>,

    /// Per-column memoized accessor results. Single-threaded by contract;
    /// see the crate docs on the concurrency model.
    value_cache: RefCell<FxHashMap<ColumnId, CellValue>>,
}

impl RowNode {
    pub fn new(id: RowId, index: usize, original: Arc<Record>) -> Self {
        RowNode {
            id,
            index,
            depth: 0,
            parent: None,
            children: Vec::new(),
            original,
            grouping_column: None,
            grouping_value: None,
            aggregates: FxHashMap::default(),
            value_cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Returns true if this is a group row produced by the grouping stage.
    pub fn is_grouped(&self) -> bool {
        self.grouping_column.is_some()
    }

    /// Returns true if this row has child rows.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// A copy of this row with tree links cleared, for insertion into a
    /// new model. Identity, record reference, and the value cache carry
    /// over; `depth`/`parent`/`children` are reassigned by the new model.
    pub fn detached(&self) -> RowNode {
        RowNode {
            id: self.id.clone(),
            index: self.index,
            depth: 0,
            parent: None,
            children: Vec::new(),
            original: Arc::clone(&self.original),
            grouping_column: self.grouping_column.clone(),
            grouping_value: self.grouping_value.clone(),
            aggregates: self.aggregates.clone(),
            value_cache: self.value_cache.clone(),
        }
    }

    /// Returns the cached value for a column, computing and storing it on
    /// first access.
    pub fn cached_value(
        &self,
        column_id: &str,
        compute: impl FnOnce(&Record) -> CellValue,
    ) -> CellValue {
        if let Some(v) = self.value_cache.borrow().get(column_id) {
            return v.clone();
        }
        let value = compute(&self.original);
        self.value_cache
            .borrow_mut()
            .insert(column_id.to_string(), value.clone());
        value
    }
}

// ============================================================================
// ROW MODEL
// ============================================================================

/// The `{rows, flat_rows, rows_by_id}` triple produced by a pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct RowModel {
    nodes: Vec<RowNode>,
    top: Vec<RowIdx>,
    flat: Vec<RowIdx>,
    by_id: FxHashMap<RowId, RowIdx>,
}

impl RowModel {
    pub fn new() -> Self {
        RowModel::default()
    }

    /// Adds a row under `parent` (or at top level) and returns its arena
    /// index. Depth and parent links are assigned here.
    pub fn add_row(&mut self, mut node: RowNode, parent: Option<RowIdx>) -> RowIdx {
        let idx = self.nodes.len();
        match parent {
            Some(p) => {
                node.depth = self.nodes[p].depth + 1;
                node.parent = Some(p);
                self.nodes.push(node);
                self.nodes[p].children.push(idx);
            }
            None => {
                node.depth = 0;
                node.parent = None;
                self.nodes.push(node);
                self.top.push(idx);
            }
        }
        idx
    }

    /// Rebuilds the flat sequence and id map from the tree. Must be called
    /// after the tree structure is final (stages call this exactly once).
    pub fn finish(&mut self) {
        self.flat.clear();
        self.by_id.clear();
        self.by_id.reserve(self.nodes.len());
        let top = self.top.clone();
        self.walk_preorder(&top);
    }

    fn walk_preorder(&mut self, indices: &[RowIdx]) {
        for &idx in indices {
            self.flat.push(idx);
            self.by_id.insert(self.nodes[idx].id.clone(), idx);
            let children = self.nodes[idx].children.clone();
            self.walk_preorder(&children);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn node(&self, idx: RowIdx) -> &RowNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: RowIdx) -> &mut RowNode {
        &mut self.nodes[idx]
    }

    /// Top-level row indices, in display order.
    pub fn top_rows(&self) -> &[RowIdx] {
        &self.top
    }

    /// Replaces the top-level order. Used by the sorting stage.
    pub fn set_top_rows(&mut self, top: Vec<RowIdx>) {
        self.top = top;
    }

    /// Pre-order flat sequence of row indices.
    pub fn flat_rows(&self) -> &[RowIdx] {
        &self.flat
    }

    /// Number of rows in the flat sequence.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Number of top-level rows.
    pub fn top_len(&self) -> usize {
        self.top.len()
    }

    /// Looks up a row by id. Missing ids are a caller bug and fatal.
    pub fn row(&self, id: &str) -> Result<&RowNode, TableError> {
        self.get_row(id)
            .ok_or_else(|| TableError::RowNotFound(id.to_string()))
    }

    /// Looks up a row by id, returning None when absent.
    pub fn get_row(&self, id: &str) -> Option<&RowNode> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Arena index of a row id, if present.
    pub fn index_of(&self, id: &str) -> Option<RowIdx> {
        self.by_id.get(id).copied()
    }

    /// Iterates all rows in flat (pre-order) order.
    pub fn iter_flat(&self) -> impl Iterator<Item = &RowNode> {
        self.flat.iter().map(move |&idx| &self.nodes[idx])
    }

    /// The value a row presents for a column: the grouping value on the
    /// grouped column, an aggregate when one was computed, otherwise the
    /// (cached) accessor result on the original record.
    pub fn row_value(
        &self,
        idx: RowIdx,
        column_id: &str,
        accessor: impl FnOnce(&Record) -> CellValue,
    ) -> CellValue {
        let node = &self.nodes[idx];
        if node.grouping_column.as_deref() == Some(column_id) {
            if let Some(v) = &node.grouping_value {
                return v.clone();
            }
        }
        if let Some(v) = node.aggregates.get(column_id) {
            return v.clone();
        }
        node.cached_value(column_id, accessor)
    }

    /// Copies the subtree rooted at `src_idx` of `src` into this model,
    /// under `parent`. Returns the new index of the subtree root.
    pub fn copy_subtree(
        &mut self,
        src: &RowModel,
        src_idx: RowIdx,
        parent: Option<RowIdx>,
    ) -> RowIdx {
        let idx = self.add_row(src.node(src_idx).detached(), parent);
        for &child in &src.node(src_idx).children {
            self.copy_subtree(src, child, Some(idx));
        }
        idx
    }
}
