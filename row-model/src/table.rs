//! FILENAME: row-model/src/table.rs
//! The table facade - one memo slot per pipeline stage, plus state setters.
//!
//! A `Table` owns the configuration, the runtime columns, the caller's
//! records, the mutable `TableState`, and six one-slot caches. Stage
//! getters run the chain Core -> Filtered -> Grouped -> Sorted ->
//! Expanded -> Paginated, recomputing a stage only when its upstream
//! model or its state slice changed. Setters replace state slices; the
//! next getter call picks the change up through the dependency tuples.

use log::trace;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use table_engine::{
    CellValue, ColumnFilter, ColumnId, ColumnSort, ExpandedState, Memo, PaginationState,
    PinSide, Record, RowId, RowModel, TableError, TableState,
};
use crate::column::ColumnSet;
use crate::core::build_core_model;
use crate::definition::TableConfig;
use crate::expanded::expand_rows;
use crate::filtered::{filter_rows, is_filtering_active};
use crate::grouped::group_rows;
use crate::header::{build_header_groups, HeaderGroup};
use crate::paginated::{clamped_page_index, page_count, paginate_rows};
use crate::selection::{self, SelectionStatus};
use crate::sorted::{is_sorting_active, sort_rows};

// ============================================================================
// MODEL REFERENCE
// ============================================================================

/// A shared row model. Equality is reference identity, so memo
/// dependency tuples compare models the way the cache compares any other
/// slice: "did the upstream output change".
#[derive(Debug, Clone)]
pub struct ModelRef(Arc<RowModel>);

impl ModelRef {
    fn new(model: RowModel) -> Self {
        ModelRef(Arc::new(model))
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ModelRef {
    type Target = RowModel;

    fn deref(&self) -> &RowModel {
        &self.0
    }
}

// ============================================================================
// CELL
// ============================================================================

/// The row x column join, with its presentation flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: CellValue,
    /// This cell holds the row's grouping value.
    pub is_grouped: bool,
    /// This cell holds an aggregate over the group's leaves.
    pub is_aggregated: bool,
    /// A group-row cell with neither a grouping value nor an aggregate.
    pub is_placeholder: bool,
}

// ============================================================================
// TABLE
// ============================================================================

/// A table instance: configuration, columns, records, state, and the
/// memoized pipeline.
pub struct Table {
    config: TableConfig,
    columns: ColumnSet,
    records: Vec<Arc<Record>>,
    /// Bumped whenever the record set is replaced.
    records_epoch: u64,
    state: TableState,

    memo_core: Memo<u64, ModelRef>,
    memo_filtered: Memo<(ModelRef, Vec<ColumnFilter>, Option<CellValue>), ModelRef>,
    memo_grouped: Memo<(ModelRef, Vec<ColumnId>), ModelRef>,
    memo_sorted: Memo<(ModelRef, Vec<ColumnSort>), ModelRef>,
    memo_expanded: Memo<(ModelRef, ExpandedState), ModelRef>,
    memo_paginated: Memo<(ModelRef, PaginationState), ModelRef>,
}

impl Table {
    /// Builds a table over the given records. Fails when a column
    /// definition has no derivable id or two definitions collide.
    pub fn new(records: Vec<Record>, config: TableConfig) -> Result<Table, TableError> {
        let columns = ColumnSet::build(&config.columns)?;
        Ok(Table {
            config,
            columns,
            records: records.into_iter().map(Arc::new).collect(),
            records_epoch: 0,
            state: TableState::default(),
            memo_core: Memo::new(),
            memo_filtered: Memo::new(),
            memo_grouped: Memo::new(),
            memo_sorted: Memo::new(),
            memo_expanded: Memo::new(),
            memo_paginated: Memo::new(),
        })
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    /// Replaces the whole state snapshot.
    pub fn set_state(&mut self, state: TableState) {
        self.state = state;
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Replaces the record set and invalidates the whole pipeline.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records.into_iter().map(Arc::new).collect();
        self.records_epoch += 1;
    }

    // ------------------------------------------------------------------------
    // Pipeline getters
    // ------------------------------------------------------------------------

    pub fn core_row_model(&mut self) -> ModelRef {
        let records = &self.records;
        let config = &self.config;
        self.memo_core.get_with(
            self.records_epoch,
            |_| ModelRef::new(build_core_model(records, config)),
            || trace!("recomputing core row model"),
        )
    }

    pub fn filtered_row_model(&mut self) -> ModelRef {
        let upstream = self.core_row_model();
        if self.config.manual_filtering {
            return upstream;
        }
        let deps = (
            upstream,
            self.state.column_filters.clone(),
            self.state.global_filter.clone(),
        );
        let columns = &self.columns;
        let state = &self.state;
        let config = &self.config;
        self.memo_filtered.get_with(
            deps,
            |(input, _, _)| {
                if is_filtering_active(input, columns, state, config) {
                    ModelRef::new(filter_rows(input, columns, state, config))
                } else {
                    input.clone()
                }
            },
            || trace!("recomputing filtered row model"),
        )
    }

    pub fn grouped_row_model(&mut self) -> ModelRef {
        let upstream = self.filtered_row_model();
        if self.config.manual_grouping || self.state.grouping.is_empty() {
            return upstream;
        }
        let deps = (upstream, self.state.grouping.clone());
        let columns = &self.columns;
        let state = &self.state;
        let config = &self.config;
        self.memo_grouped.get_with(
            deps,
            |(input, _)| ModelRef::new(group_rows(input, columns, state, config)),
            || trace!("recomputing grouped row model"),
        )
    }

    pub fn sorted_row_model(&mut self) -> ModelRef {
        let upstream = self.grouped_row_model();
        if self.config.manual_sorting {
            return upstream;
        }
        let deps = (upstream, self.state.sorting.clone());
        let columns = &self.columns;
        let state = &self.state;
        let config = &self.config;
        self.memo_sorted.get_with(
            deps,
            |(input, _)| {
                if is_sorting_active(input, columns, state, config) {
                    ModelRef::new(sort_rows(input, columns, state, config))
                } else {
                    input.clone()
                }
            },
            || trace!("recomputing sorted row model"),
        )
    }

    pub fn expanded_row_model(&mut self) -> ModelRef {
        let upstream = self.sorted_row_model();
        if self.config.manual_expanding {
            return upstream;
        }
        let deps = (upstream, self.state.expanded.clone());
        self.memo_expanded.get_with(
            deps,
            |(input, expanded)| ModelRef::new(expand_rows(input, expanded)),
            || trace!("recomputing expanded row model"),
        )
    }

    pub fn paginated_row_model(&mut self) -> ModelRef {
        let upstream = self.expanded_row_model();
        if self.config.manual_pagination {
            return upstream;
        }
        let deps = (upstream, self.state.pagination);
        let config = &self.config;
        self.memo_paginated.get_with(
            deps,
            |(input, pagination)| ModelRef::new(paginate_rows(input, pagination, config)),
            || trace!("recomputing paginated row model"),
        )
    }

    // ------------------------------------------------------------------------
    // Filtering / sorting / grouping setters
    // ------------------------------------------------------------------------

    pub fn set_column_filters(&mut self, filters: Vec<ColumnFilter>) {
        self.state.column_filters = filters;
    }

    pub fn set_column_filter(&mut self, id: impl Into<ColumnId>, value: CellValue) {
        let id = id.into();
        self.state.column_filters.retain(|f| f.id != id);
        self.state.column_filters.push(ColumnFilter { id, value });
    }

    pub fn set_global_filter(&mut self, value: Option<CellValue>) {
        self.state.global_filter = value;
    }

    pub fn set_sorting(&mut self, sorting: Vec<ColumnSort>) {
        self.state.sorting = sorting;
    }

    pub fn set_grouping(&mut self, grouping: Vec<ColumnId>) {
        self.state.grouping = grouping;
    }

    // ------------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------------

    pub fn set_expanded(&mut self, expanded: ExpandedState) {
        self.state.expanded = expanded;
    }

    pub fn toggle_expanded(&mut self, id: &str) {
        if matches!(self.state.expanded, ExpandedState::All) {
            // Collapsing one row materializes the set of expanded ids.
            let sorted = self.sorted_row_model();
            let mut map = FxHashMap::default();
            for row in sorted.iter_flat() {
                if row.has_children() && row.id != id {
                    map.insert(row.id.clone(), true);
                }
            }
            self.state.expanded = ExpandedState::Rows(map);
            return;
        }
        if let ExpandedState::Rows(map) = &mut self.state.expanded {
            if map.get(id).copied().unwrap_or(false) {
                map.remove(id);
            } else {
                map.insert(id.to_string(), true);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    /// Number of pages for the current state.
    pub fn page_count(&mut self) -> usize {
        let expanded = self.expanded_row_model();
        page_count(&expanded, &self.state.pagination, &self.config)
    }

    /// Sets the page index, clamped to the valid range.
    pub fn set_page_index(&mut self, index: usize) {
        let expanded = self.expanded_row_model();
        let mut pagination = self.state.pagination;
        pagination.page_index = index;
        self.state.pagination.page_index =
            clamped_page_index(&expanded, &pagination, &self.config);
    }

    /// Sets the page size, repositioning the page index so the previous
    /// top row stays on the visible page.
    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        let top_row = self.state.pagination.page_index * self.state.pagination.page_size;
        self.state.pagination.page_size = size;
        self.state.pagination.page_index = top_row / size;
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn is_row_selected(&self, id: &str) -> bool {
        selection::is_selected(&self.state.row_selection, id)
    }

    /// Selects or deselects a row, cascading into its descendants.
    pub fn toggle_selected(&mut self, id: &str, value: bool) {
        self.toggle_selected_with(id, value, true);
    }

    pub fn toggle_selected_with(&mut self, id: &str, value: bool, include_children: bool) {
        let model = self.sorted_row_model();
        selection::toggle_selected(
            &model,
            &self.config,
            &mut self.state.row_selection,
            id,
            value,
            include_children,
        );
    }

    /// Tri-state classification of a row's subtree.
    pub fn row_subtree_status(&mut self, id: &str) -> SelectionStatus {
        let model = self.sorted_row_model();
        selection::subtree_status(&model, &self.config, &self.state.row_selection, id)
    }

    /// Selects or deselects every pre-grouped row.
    pub fn toggle_all_selected(&mut self, value: bool) {
        let model = self.filtered_row_model();
        selection::select_all(&model, &self.config, &mut self.state.row_selection, value);
    }

    /// Selects or deselects the current page's rows.
    pub fn toggle_all_page_selected(&mut self, value: bool) {
        let model = self.paginated_row_model();
        selection::select_all(&model, &self.config, &mut self.state.row_selection, value);
    }

    pub fn is_all_rows_selected(&mut self) -> bool {
        let model = self.filtered_row_model();
        self.all_selected_in(&model)
    }

    pub fn is_all_page_rows_selected(&mut self) -> bool {
        let model = self.paginated_row_model();
        self.all_selected_in(&model)
    }

    fn all_selected_in(&self, model: &RowModel) -> bool {
        let mut saw_selectable = false;
        for row in model.iter_flat() {
            if !self.config.row_selection.allows(&row.original) {
                continue;
            }
            saw_selectable = true;
            if !self.is_row_selected(&row.id) {
                return false;
            }
        }
        saw_selectable
    }

    // ------------------------------------------------------------------------
    // Column presentation
    // ------------------------------------------------------------------------

    /// Visible leaf column ids in display order, grouped-column mode
    /// applied.
    pub fn visible_leaf_columns(&self) -> Vec<ColumnId> {
        self.columns
            .visible_leaf_ids(&self.state, self.config.grouped_column_mode)
    }

    /// Header bands over the visible leaves.
    pub fn header_groups(&self) -> Vec<HeaderGroup> {
        build_header_groups(&self.columns, &self.visible_leaf_columns())
    }

    /// (left pinned, center, right pinned) visible leaves.
    pub fn pinned_columns(&self) -> (Vec<ColumnId>, Vec<ColumnId>, Vec<ColumnId>) {
        self.columns
            .partition_pinned(&self.state, self.config.grouped_column_mode)
    }

    pub fn column_size(&self, id: &str) -> f64 {
        self.columns.size_of(id, &self.state)
    }

    pub fn set_column_visibility(&mut self, id: impl Into<ColumnId>, visible: bool) {
        self.state.column_visibility.insert(id.into(), visible);
    }

    pub fn set_column_order(&mut self, order: Vec<ColumnId>) {
        self.state.column_order = order;
    }

    pub fn pin_column(&mut self, id: &str, side: Option<PinSide>) {
        self.state.column_pinning.left.retain(|c| c != id);
        self.state.column_pinning.right.retain(|c| c != id);
        match side {
            Some(PinSide::Left) => self.state.column_pinning.left.push(id.to_string()),
            Some(PinSide::Right) => self.state.column_pinning.right.push(id.to_string()),
            None => {}
        }
    }

    pub fn set_column_size(&mut self, id: impl Into<ColumnId>, size: f64) {
        let id = id.into();
        if self.config.enable_column_resizing
            && self.columns.get(&id).is_some_and(|c| c.can_resize())
        {
            self.state.column_sizing.insert(id, size);
        }
    }

    // ------------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------------

    /// The cell for a visible row and column, with presentation flags.
    pub fn cell(&mut self, row_id: &str, column_id: &str) -> Option<Cell> {
        let model = self.paginated_row_model();
        let idx = model.index_of(row_id)?;
        self.columns.get(column_id)?;
        let node = model.node(idx);

        let is_grouped = node.grouping_column.as_deref() == Some(column_id);
        let is_aggregated = !is_grouped && node.aggregates.contains_key(column_id);
        let is_placeholder = node.is_grouped() && !is_grouped && !is_aggregated;
        Some(Cell {
            row_id: node.id.clone(),
            column_id: column_id.to_string(),
            value: self.columns.row_value(&model, idx, column_id),
            is_grouped,
            is_aggregated,
            is_placeholder,
        })
    }
}
