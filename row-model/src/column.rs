//! FILENAME: row-model/src/column.rs
//! Runtime columns - definitions flattened into addressable entities.
//!
//! A `ColumnSet` is built once per table instance from the definition
//! tree. It validates ids (derivable, unique), records depth and parent
//! links for header banding, and keeps the leaf order.
//!
//! Presentation state (visibility, order, pinning, sizing, grouping
//! membership) lives in `TableState`; this module only projects it.
//! Columns own no mutable state of their own.

use rustc_hash::FxHashMap;
use table_engine::{ColumnId, PinSide, TableError, TableState};
use crate::definition::{ColumnDef, GroupedColumnMode};

// ============================================================================
// COLUMN
// ============================================================================

/// One runtime column (leaf or header group), derived from its definition.
#[derive(Debug, Clone)]
pub struct Column {
    /// Resolved id, unique within the table.
    pub id: ColumnId,
    /// The definition this column was built from. Group columns keep
    /// their children here for header banding.
    pub def: ColumnDef,
    /// Depth in the definition tree. Top-level definitions are depth 0.
    pub depth: usize,
    /// Id of the parent group column, if any.
    pub parent: Option<ColumnId>,
}

impl Column {
    /// Returns true if this column carries data cells (no child columns).
    pub fn is_leaf(&self) -> bool {
        !self.def.is_group()
    }

    /// Header text: explicit header, else the id.
    pub fn header_text(&self) -> &str {
        self.def.header.as_deref().unwrap_or(&self.id)
    }

    pub fn can_sort(&self) -> bool {
        self.is_leaf() && self.def.enable_sorting
    }

    pub fn can_filter(&self) -> bool {
        self.is_leaf() && self.def.enable_column_filter
    }

    pub fn can_global_filter(&self) -> bool {
        self.is_leaf() && self.def.enable_global_filter
    }

    pub fn can_group(&self) -> bool {
        self.is_leaf() && self.def.enable_grouping
    }

    pub fn can_hide(&self) -> bool {
        self.def.enable_hiding
    }

    pub fn can_pin(&self) -> bool {
        self.def.enable_pinning
    }

    pub fn can_resize(&self) -> bool {
        self.def.enable_resizing
    }
}

// ============================================================================
// COLUMN SET
// ============================================================================

/// All runtime columns of a table, flattened from the definition tree.
#[derive(Debug, Clone)]
pub struct ColumnSet {
    /// Every column, groups included, in definition (pre-order) order.
    all: Vec<Column>,
    /// Id -> position in `all`.
    by_id: FxHashMap<ColumnId, usize>,
    /// Positions of leaf columns, in definition order.
    leaves: Vec<usize>,
    /// Deepest definition nesting, for header banding.
    max_depth: usize,
}

impl ColumnSet {
    /// Flattens a definition tree into runtime columns. Fails when any
    /// definition has no derivable id or two definitions resolve to the
    /// same id.
    pub fn build(defs: &[ColumnDef]) -> Result<ColumnSet, TableError> {
        let mut set = ColumnSet {
            all: Vec::new(),
            by_id: FxHashMap::default(),
            leaves: Vec::new(),
            max_depth: 0,
        };
        for def in defs {
            set.add_def(def, 0, None)?;
        }
        Ok(set)
    }

    fn add_def(
        &mut self,
        def: &ColumnDef,
        depth: usize,
        parent: Option<&str>,
    ) -> Result<(), TableError> {
        let id = def.resolve_id()?;
        if self.by_id.contains_key(&id) {
            return Err(TableError::DuplicateColumnId(id));
        }

        let idx = self.all.len();
        self.all.push(Column {
            id: id.clone(),
            def: def.clone(),
            depth,
            parent: parent.map(str::to_string),
        });
        self.by_id.insert(id.clone(), idx);
        self.max_depth = self.max_depth.max(depth);

        if def.is_group() {
            for child in &def.columns {
                self.add_def(child, depth + 1, Some(&id))?;
            }
        } else {
            self.leaves.push(idx);
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Column> {
        self.by_id.get(id).map(|&idx| &self.all[idx])
    }

    pub fn all_columns(&self) -> impl Iterator<Item = &Column> {
        self.all.iter()
    }

    /// Leaf columns in definition order.
    pub fn leaf_columns(&self) -> impl Iterator<Item = &Column> {
        self.leaves.iter().map(|&idx| &self.all[idx])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Deepest nesting level of the definition tree.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The value a row presents for a column, through the row's cache and
    /// the column's accessor. Unknown columns read as `Empty`.
    pub fn row_value(
        &self,
        model: &table_engine::RowModel,
        idx: table_engine::RowIdx,
        id: &str,
    ) -> table_engine::CellValue {
        match self.get(id) {
            Some(col) => model.row_value(idx, id, |rec| col.def.accessor.value_of(rec)),
            None => table_engine::CellValue::Empty,
        }
    }

    // ------------------------------------------------------------------------
    // Presentation projections
    // ------------------------------------------------------------------------

    /// Returns true if the column is currently visible. Columns without a
    /// visibility entry are visible; columns that cannot hide always are.
    pub fn is_visible(&self, id: &str, state: &TableState) -> bool {
        match self.get(id) {
            Some(col) if !col.can_hide() => true,
            Some(_) => state.column_visibility.get(id).copied().unwrap_or(true),
            None => false,
        }
    }

    /// Leaf ids in display order: explicitly ordered ids first (skipping
    /// unknown or non-leaf ids), then the remaining leaves in definition
    /// order.
    pub fn ordered_leaf_ids(&self, state: &TableState) -> Vec<ColumnId> {
        let mut out = Vec::with_capacity(self.leaves.len());
        for id in &state.column_order {
            if let Some(col) = self.get(id) {
                if col.is_leaf() && !out.contains(id) {
                    out.push(id.clone());
                }
            }
        }
        for col in self.leaf_columns() {
            if !out.contains(&col.id) {
                out.push(col.id.clone());
            }
        }
        out
    }

    /// Visible leaf ids in display order, with the grouped-column mode
    /// applied: grouped columns move to the front (`Reorder`), disappear
    /// (`Remove`), or stay where they are (`None`).
    pub fn visible_leaf_ids(&self, state: &TableState, mode: GroupedColumnMode) -> Vec<ColumnId> {
        let ordered: Vec<ColumnId> = self
            .ordered_leaf_ids(state)
            .into_iter()
            .filter(|id| self.is_visible(id, state))
            .collect();

        if state.grouping.is_empty() {
            return ordered;
        }
        match mode {
            GroupedColumnMode::Reorder => {
                let mut out: Vec<ColumnId> = state
                    .grouping
                    .iter()
                    .filter(|g| ordered.contains(g))
                    .cloned()
                    .collect();
                for id in ordered {
                    if !state.is_grouped(&id) {
                        out.push(id);
                    }
                }
                out
            }
            GroupedColumnMode::Remove => ordered
                .into_iter()
                .filter(|id| !state.is_grouped(id))
                .collect(),
            GroupedColumnMode::None => ordered,
        }
    }

    /// Splits visible leaves into (left-pinned, center, right-pinned).
    /// Pinned sections follow the pinning lists' order; the center keeps
    /// display order.
    pub fn partition_pinned(
        &self,
        state: &TableState,
        mode: GroupedColumnMode,
    ) -> (Vec<ColumnId>, Vec<ColumnId>, Vec<ColumnId>) {
        let visible = self.visible_leaf_ids(state, mode);
        let mut left = Vec::new();
        let mut right = Vec::new();

        for id in &state.column_pinning.left {
            if visible.contains(id) && self.get(id).is_some_and(|c| c.can_pin()) {
                left.push(id.clone());
            }
        }
        for id in &state.column_pinning.right {
            if visible.contains(id) && self.get(id).is_some_and(|c| c.can_pin()) {
                right.push(id.clone());
            }
        }
        let center = visible
            .into_iter()
            .filter(|id| !left.contains(id) && !right.contains(id))
            .collect();
        (left, center, right)
    }

    /// Current pin side of a column, honouring its pinnability.
    pub fn pin_side(&self, id: &str, state: &TableState) -> Option<PinSide> {
        let col = self.get(id)?;
        if !col.can_pin() {
            return None;
        }
        state.column_pinning.side_of(id)
    }

    /// Current width of a column in pixels: the sizing override clamped to
    /// the definition's min/max, else the definition default.
    pub fn size_of(&self, id: &str, state: &TableState) -> f64 {
        let Some(col) = self.get(id) else {
            return 0.0;
        };
        let requested = state
            .column_sizing
            .get(id)
            .copied()
            .unwrap_or(col.def.size);
        requested.clamp(col.def.min_size, col.def.max_size)
    }

    /// Total width of the visible leaves.
    pub fn total_size(&self, state: &TableState, mode: GroupedColumnMode) -> f64 {
        self.visible_leaf_ids(state, mode)
            .iter()
            .map(|id| self.size_of(id, state))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_engine::ColumnPinning;

    fn sample_set() -> ColumnSet {
        ColumnSet::build(&[
            ColumnDef::group(
                "Name",
                vec![ColumnDef::new("first"), ColumnDef::new("last")],
            ),
            ColumnDef::new("status"),
            ColumnDef::new("amount"),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_flattens_groups() {
        let set = sample_set();
        assert_eq!(set.leaf_count(), 4);
        assert_eq!(set.max_depth(), 1);

        let first = set.get("first").unwrap();
        assert_eq!(first.depth, 1);
        assert_eq!(first.parent.as_deref(), Some("Name"));
        assert!(first.is_leaf());

        let group = set.get("Name").unwrap();
        assert!(!group.is_leaf());
        assert_eq!(group.depth, 0);
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let result = ColumnSet::build(&[ColumnDef::new("a"), ColumnDef::new("a")]);
        assert_eq!(result.err(), Some(TableError::DuplicateColumnId("a".to_string())));
    }

    #[test]
    fn test_ordered_leaf_ids() {
        let set = sample_set();
        let mut state = TableState::default();
        state.column_order = vec!["amount".to_string(), "unknown".to_string()];

        let ids = set.ordered_leaf_ids(&state);
        assert_eq!(ids, vec!["amount", "first", "last", "status"]);
    }

    #[test]
    fn test_visibility_defaults_to_visible() {
        let set = sample_set();
        let mut state = TableState::default();
        assert!(set.is_visible("status", &state));

        state.column_visibility.insert("status".to_string(), false);
        assert!(!set.is_visible("status", &state));

        let ids = set.visible_leaf_ids(&state, GroupedColumnMode::None);
        assert_eq!(ids, vec!["first", "last", "amount"]);
    }

    #[test]
    fn test_grouped_column_reorder_and_remove() {
        let set = sample_set();
        let mut state = TableState::default();
        state.grouping = vec!["status".to_string()];

        let reordered = set.visible_leaf_ids(&state, GroupedColumnMode::Reorder);
        assert_eq!(reordered, vec!["status", "first", "last", "amount"]);

        let removed = set.visible_leaf_ids(&state, GroupedColumnMode::Remove);
        assert_eq!(removed, vec!["first", "last", "amount"]);

        let untouched = set.visible_leaf_ids(&state, GroupedColumnMode::None);
        assert_eq!(untouched, vec!["first", "last", "status", "amount"]);
    }

    #[test]
    fn test_pinning_partition() {
        let set = sample_set();
        let mut state = TableState::default();
        state.column_pinning = ColumnPinning {
            left: vec!["amount".to_string()],
            right: vec!["first".to_string()],
        };

        let (left, center, right) = set.partition_pinned(&state, GroupedColumnMode::None);
        assert_eq!(left, vec!["amount"]);
        assert_eq!(center, vec!["last", "status"]);
        assert_eq!(right, vec!["first"]);
    }

    #[test]
    fn test_sizing_clamped() {
        let set = ColumnSet::build(&[ColumnDef::new("a").with_size(200.0)]).unwrap();
        let mut state = TableState::default();
        assert_eq!(set.size_of("a", &state), 200.0);

        state.column_sizing.insert("a".to_string(), 9999.0);
        assert_eq!(set.size_of("a", &state), 500.0);

        state.column_sizing.insert("a".to_string(), 1.0);
        assert_eq!(set.size_of("a", &state), 20.0);
    }
}
