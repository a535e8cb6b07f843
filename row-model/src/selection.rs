//! FILENAME: row-model/src/selection.rs
//! Selection stage - hierarchical row selection over the selection map.
//!
//! Selection state is the caller-owned `row_selection` map; rows absent
//! from it are unselected. Toggling cascades into selectable descendants
//! by default, single-select mode clears the map first, and a subtree
//! classifies as fully, partially, or not selected.

use rustc_hash::FxHashMap;
use serde::Serialize;
use table_engine::{RowId, RowIdx, RowModel};
use crate::definition::TableConfig;

/// How much of a subtree is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionStatus {
    All,
    Some,
    None,
}

/// Sets a row's selection, cascading into its selectable descendants
/// when `include_children` holds. Rows the selection policy rejects are
/// never recorded.
pub fn toggle_selected(
    model: &RowModel,
    config: &TableConfig,
    selection: &mut FxHashMap<RowId, bool>,
    id: &str,
    value: bool,
    include_children: bool,
) {
    let Some(idx) = model.index_of(id) else {
        return;
    };
    if value && !config.enable_multi_row_selection {
        selection.clear();
    }
    set_row(model, config, selection, idx, value);
    if include_children && config.enable_sub_row_selection {
        cascade(model, config, selection, idx, value);
    }
}

fn cascade(
    model: &RowModel,
    config: &TableConfig,
    selection: &mut FxHashMap<RowId, bool>,
    idx: RowIdx,
    value: bool,
) {
    for &child in &model.node(idx).children {
        set_row(model, config, selection, child, value);
        cascade(model, config, selection, child, value);
    }
}

fn set_row(
    model: &RowModel,
    config: &TableConfig,
    selection: &mut FxHashMap<RowId, bool>,
    idx: RowIdx,
    value: bool,
) {
    let node = model.node(idx);
    if !config.row_selection.allows(&node.original) {
        return;
    }
    if value {
        selection.insert(node.id.clone(), true);
    } else {
        selection.remove(&node.id);
    }
}

/// Selects or deselects every selectable row of `model`.
pub fn select_all(
    model: &RowModel,
    config: &TableConfig,
    selection: &mut FxHashMap<RowId, bool>,
    value: bool,
) {
    for &idx in model.flat_rows() {
        set_row(model, config, selection, idx, value);
    }
}

/// Returns true if the row is recorded as selected.
pub fn is_selected(selection: &FxHashMap<RowId, bool>, id: &str) -> bool {
    selection.get(id).copied().unwrap_or(false)
}

/// Classifies a row's subtree: `All` when every selectable child is
/// exactly selected (subtree included), `Some` when any child is fully
/// or partially selected, `None` otherwise. A row without children
/// classifies by its own selection.
pub fn subtree_status(
    model: &RowModel,
    config: &TableConfig,
    selection: &FxHashMap<RowId, bool>,
    id: &str,
) -> SelectionStatus {
    match model.index_of(id) {
        Some(idx) => classify(model, config, selection, idx),
        None => SelectionStatus::None,
    }
}

fn classify(
    model: &RowModel,
    config: &TableConfig,
    selection: &FxHashMap<RowId, bool>,
    idx: RowIdx,
) -> SelectionStatus {
    let node = model.node(idx);
    if !node.has_children() {
        return if is_selected(selection, &node.id) {
            SelectionStatus::All
        } else {
            SelectionStatus::None
        };
    }

    let mut saw_selectable = false;
    let mut all = true;
    let mut some = false;
    for &child in &node.children {
        let child_node = model.node(child);
        if !config.row_selection.allows(&child_node.original) {
            continue;
        }
        saw_selectable = true;
        let child_selected = is_selected(selection, &child_node.id);
        let child_subtree = if child_node.has_children() {
            classify(model, config, selection, child)
        } else if child_selected {
            SelectionStatus::All
        } else {
            SelectionStatus::None
        };

        // "Exactly selected" means the child itself plus its whole subtree.
        let fully = child_selected && child_subtree == SelectionStatus::All;
        let partially = !fully
            && (child_selected || child_subtree != SelectionStatus::None);
        if fully {
            some = true;
        } else {
            all = false;
            if partially {
                some = true;
            }
        }
    }

    if saw_selectable && all {
        SelectionStatus::All
    } else if some {
        SelectionStatus::Some
    } else {
        SelectionStatus::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use table_engine::{Record, RowNode};
    use crate::definition::{ColumnDef, RowSelectionPolicy};

    fn tree() -> RowModel {
        let record = Arc::new(Record::new().with("ok", true));
        let mut model = RowModel::new();
        let a = model.add_row(RowNode::new("a".into(), 0, Arc::clone(&record)), None);
        model.add_row(RowNode::new("a.0".into(), 0, Arc::clone(&record)), Some(a));
        let a1 = model.add_row(RowNode::new("a.1".into(), 1, Arc::clone(&record)), Some(a));
        model.add_row(RowNode::new("a.1.0".into(), 0, Arc::clone(&record)), Some(a1));
        model.add_row(RowNode::new("b".into(), 1, record), None);
        model.finish();
        model
    }

    fn config() -> TableConfig {
        TableConfig::new(vec![ColumnDef::new("ok")])
    }

    #[test]
    fn test_cascade_selects_descendants() {
        let model = tree();
        let config = config();
        let mut selection = FxHashMap::default();

        toggle_selected(&model, &config, &mut selection, "a", true, true);
        for id in ["a", "a.0", "a.1", "a.1.0"] {
            assert!(is_selected(&selection, id), "{} should be selected", id);
        }
        assert!(!is_selected(&selection, "b"));

        toggle_selected(&model, &config, &mut selection, "a", false, true);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_no_cascade_without_children_flag() {
        let model = tree();
        let config = config();
        let mut selection = FxHashMap::default();
        toggle_selected(&model, &config, &mut selection, "a", true, false);
        assert!(is_selected(&selection, "a"));
        assert!(!is_selected(&selection, "a.0"));
    }

    #[test]
    fn test_single_select_clears_previous() {
        let model = tree();
        let mut config = config();
        config.enable_multi_row_selection = false;
        let mut selection = FxHashMap::default();

        toggle_selected(&model, &config, &mut selection, "b", true, false);
        toggle_selected(&model, &config, &mut selection, "a.0", true, false);
        assert!(!is_selected(&selection, "b"));
        assert!(is_selected(&selection, "a.0"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_selection_policy_blocks_rows() {
        let model = tree();
        let mut config = config();
        config.row_selection = RowSelectionPolicy::Where(Arc::new(|r| {
            r.get("ok") != table_engine::CellValue::Bool(true)
        }));
        let mut selection = FxHashMap::default();
        toggle_selected(&model, &config, &mut selection, "a", true, true);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_subtree_classification() {
        let model = tree();
        let config = config();
        let mut selection = FxHashMap::default();

        assert_eq!(
            subtree_status(&model, &config, &selection, "a"),
            SelectionStatus::None
        );

        toggle_selected(&model, &config, &mut selection, "a.0", true, true);
        assert_eq!(
            subtree_status(&model, &config, &selection, "a"),
            SelectionStatus::Some
        );

        toggle_selected(&model, &config, &mut selection, "a.1", true, true);
        assert_eq!(
            subtree_status(&model, &config, &selection, "a"),
            SelectionStatus::All
        );

        // A partially selected child downgrades the parent to Some.
        toggle_selected(&model, &config, &mut selection, "a.1.0", false, false);
        assert_eq!(
            subtree_status(&model, &config, &selection, "a"),
            SelectionStatus::Some
        );
    }

    #[test]
    fn test_select_all() {
        let model = tree();
        let config = config();
        let mut selection = FxHashMap::default();
        select_all(&model, &config, &mut selection, true);
        assert_eq!(selection.len(), 5);
        select_all(&model, &config, &mut selection, false);
        assert!(selection.is_empty());
    }
}
