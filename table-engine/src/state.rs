//! FILENAME: table-engine/src/state.rs
//! Table State - the caller-owned, serializable state substrate.
//!
//! This is the only mutable state in the system. Pipeline stages read
//! immutable snapshots of these slices and never write back; mutation goes
//! through explicit setters on the table facade, which replace a slice and
//! thereby invalidate the memoized stages that depend on it.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use crate::value::CellValue;

/// Identifier of a column within a table instance.
pub type ColumnId = String;

/// Identifier of a row within a row model.
pub type RowId = String;

// ============================================================================
// FILTERING STATE
// ============================================================================

/// One active column filter: the column it targets and the filter value.
///
/// The value's shape depends on the filter function: text for substring
/// matches, a list for containment filters, a two-element list for
/// number ranges (with `Empty` marking an open bound).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: ColumnId,
    pub value: CellValue,
}

// ============================================================================
// SORTING STATE
// ============================================================================

/// One sort criterion. Criteria are applied in list order; earlier entries
/// win, later entries break ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: ColumnId,
    pub desc: bool,
}

// ============================================================================
// COLUMN PRESENTATION STATE
// ============================================================================

/// Which side a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinSide {
    Left,
    Right,
}

/// Pinned column ids, per side. Columns on neither list are "center".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPinning {
    #[serde(default)]
    pub left: Vec<ColumnId>,
    #[serde(default)]
    pub right: Vec<ColumnId>,
}

impl ColumnPinning {
    /// Returns the pin side of a column, if it is pinned at all.
    pub fn side_of(&self, id: &str) -> Option<PinSide> {
        if self.left.iter().any(|c| c == id) {
            Some(PinSide::Left)
        } else if self.right.iter().any(|c| c == id) {
            Some(PinSide::Right)
        } else {
            None
        }
    }
}

// ============================================================================
// EXPANSION STATE
// ============================================================================

/// Which rows are expanded. `All` expands every row with children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpandedState {
    All,
    Rows(FxHashMap<RowId, bool>),
}

impl ExpandedState {
    pub fn is_expanded(&self, id: &str) -> bool {
        match self {
            ExpandedState::All => true,
            ExpandedState::Rows(map) => map.get(id).copied().unwrap_or(false),
        }
    }

    /// Returns true if no row is expanded.
    pub fn is_collapsed_everywhere(&self) -> bool {
        match self {
            ExpandedState::All => false,
            ExpandedState::Rows(map) => !map.values().any(|v| *v),
        }
    }
}

impl Default for ExpandedState {
    fn default() -> Self {
        ExpandedState::Rows(FxHashMap::default())
    }
}

// ============================================================================
// PAGINATION STATE
// ============================================================================

/// The pagination cursor: which page, and how many top-level rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState {
            page_index: 0,
            page_size: 10,
        }
    }
}

// ============================================================================
// MAIN STATE STRUCT
// ============================================================================

/// The complete table state. Every field has a serde default so partial
/// state snapshots deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    /// Active per-column filters, in application order.
    #[serde(default)]
    pub column_filters: Vec<ColumnFilter>,

    /// The global filter value, applied across globally filterable columns.
    #[serde(default)]
    pub global_filter: Option<CellValue>,

    /// Active sort criteria, outermost first.
    #[serde(default)]
    pub sorting: Vec<ColumnSort>,

    /// Grouping column ids, outermost first.
    #[serde(default)]
    pub grouping: Vec<ColumnId>,

    /// Column visibility overrides. Absent columns are visible.
    #[serde(default)]
    pub column_visibility: FxHashMap<ColumnId, bool>,

    /// Explicit column order. Columns not listed keep definition order
    /// after the listed ones.
    #[serde(default)]
    pub column_order: Vec<ColumnId>,

    /// Pinned columns per side.
    #[serde(default)]
    pub column_pinning: ColumnPinning,

    /// Column width overrides, in pixels.
    #[serde(default)]
    pub column_sizing: FxHashMap<ColumnId, f64>,

    /// Expanded rows.
    #[serde(default)]
    pub expanded: ExpandedState,

    /// Pagination cursor.
    #[serde(default)]
    pub pagination: PaginationState,

    /// Selected rows. Absence means unselected.
    #[serde(default)]
    pub row_selection: FxHashMap<RowId, bool>,
}

impl TableState {
    /// Returns the filter value for a column, if one is active.
    pub fn column_filter_value(&self, id: &str) -> Option<&CellValue> {
        self.column_filters
            .iter()
            .find(|f| f.id == id)
            .map(|f| &f.value)
    }

    /// Returns the position of a column in the sorting list, if sorted.
    pub fn sort_index(&self, id: &str) -> Option<usize> {
        self.sorting.iter().position(|s| s.id == id)
    }

    /// Returns true if the column participates in the current grouping.
    pub fn is_grouped(&self, id: &str) -> bool {
        self.grouping.iter().any(|g| g == id)
    }

    /// Returns true if the row is currently selected.
    pub fn is_row_selected(&self, id: &str) -> bool {
        self.row_selection.get(id).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_inactive() {
        let state = TableState::default();
        assert!(state.column_filters.is_empty());
        assert!(state.global_filter.is_none());
        assert!(state.sorting.is_empty());
        assert!(state.grouping.is_empty());
        assert!(state.expanded.is_collapsed_everywhere());
        assert_eq!(state.pagination.page_index, 0);
        assert_eq!(state.pagination.page_size, 10);
    }

    #[test]
    fn test_pinning_side_of() {
        let pinning = ColumnPinning {
            left: vec!["a".to_string()],
            right: vec!["b".to_string()],
        };
        assert_eq!(pinning.side_of("a"), Some(PinSide::Left));
        assert_eq!(pinning.side_of("b"), Some(PinSide::Right));
        assert_eq!(pinning.side_of("c"), None);
    }

    #[test]
    fn test_expanded_state_all() {
        let expanded = ExpandedState::All;
        assert!(expanded.is_expanded("anything"));
        assert!(!expanded.is_collapsed_everywhere());
    }

    #[test]
    fn test_state_deserializes_from_partial_json() {
        let state: TableState =
            serde_json::from_str(r#"{"sorting":[{"id":"amount","desc":true}]}"#).unwrap();
        assert_eq!(state.sorting.len(), 1);
        assert!(state.sorting[0].desc);
        assert!(state.column_filters.is_empty());
    }

    #[test]
    fn test_column_filter_value_lookup() {
        let mut state = TableState::default();
        state.column_filters.push(ColumnFilter {
            id: "status".to_string(),
            value: CellValue::text("Active"),
        });
        assert_eq!(
            state.column_filter_value("status"),
            Some(&CellValue::text("Active"))
        );
        assert_eq!(state.column_filter_value("other"), None);
    }
}
