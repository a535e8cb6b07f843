//! FILENAME: row-model/src/filtered.rs
//! Filtering stage - per-column and global predicates over the row tree.
//!
//! Column filters AND together; the global filter ORs across every
//! globally filterable column and ANDs with the column filters. Vacuous
//! filter values (empty string, empty list, open range) deactivate their
//! filter. Unresolvable filters are skipped with a diagnostic, never an
//! error.
//!
//! Tree data filters under one of two traversal policies: root-first
//! (depth-limited, a parent survives by passing or by keeping a filtered
//! child) or leaf-first (recursion to the leaves before any parent is
//! judged).

use log::warn;
use table_engine::{CellValue, ColumnId, RowIdx, RowModel, TableState};
use crate::column::ColumnSet;
use crate::definition::{TableConfig, TreeFilterPolicy};
use crate::filter_fns::FilterFn;

/// One filter after resolution: a concrete matcher bound to a column.
struct ActiveFilter {
    column_id: ColumnId,
    matcher: FilterFn,
    value: CellValue,
}

/// Applies the active column and global filters to `input`.
pub fn filter_rows(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> RowModel {
    let column_filters = resolve_column_filters(input, columns, state, config);
    let global_filters = resolve_global_filters(input, columns, state, config);

    let passes = |idx: RowIdx| -> bool {
        let column_pass = column_filters.iter().all(|f| {
            let value = columns.row_value(input, idx, &f.column_id);
            f.matcher.matches(&value, &f.value)
        });
        if !column_pass {
            return false;
        }
        if global_filters.is_empty() {
            return true;
        }
        global_filters.iter().any(|f| {
            let value = columns.row_value(input, idx, &f.column_id);
            f.matcher.matches(&value, &f.value)
        })
    };

    let mut output = RowModel::new();
    for &top in input.top_rows() {
        let kept = match config.tree_filter_policy {
            TreeFilterPolicy::RootFirst => {
                decide_root_first(input, top, 0, config.max_leaf_row_filter_depth, &passes)
            }
            TreeFilterPolicy::LeafFirst => decide_leaf_first(input, top, &passes),
        };
        if let Some(kept) = kept {
            emit(&mut output, input, &kept, None);
        }
    }
    output.finish();
    output
}

/// Returns true if any filter would actually run against `input`.
pub fn is_filtering_active(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> bool {
    !resolve_column_filters(input, columns, state, config).is_empty()
        || !resolve_global_filters(input, columns, state, config).is_empty()
}

// ============================================================================
// FILTER RESOLUTION
// ============================================================================

fn resolve_column_filters(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> Vec<ActiveFilter> {
    if !config.enable_filters {
        return Vec::new();
    }
    let mut active = Vec::new();
    for filter in &state.column_filters {
        let Some(column) = columns.get(&filter.id) else {
            warn!("column filter targets unknown column '{}', skipping", filter.id);
            continue;
        };
        if !column.can_filter() {
            warn!("column '{}' is not filterable, skipping its filter", filter.id);
            continue;
        }
        let sample = sample_value(input, columns, &filter.id);
        let Some(matcher) = column.def.filter_fn.resolve(sample.as_ref()) else {
            warn!(
                "unknown filter function '{}' on column '{}', skipping",
                column.def.filter_fn.name(),
                filter.id
            );
            continue;
        };
        if matcher.is_auto_removed(&filter.value) {
            continue;
        }
        active.push(ActiveFilter {
            column_id: filter.id.clone(),
            matcher,
            value: filter.value.clone(),
        });
    }
    active
}

fn resolve_global_filters(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> Vec<ActiveFilter> {
    if !config.enable_filters {
        return Vec::new();
    }
    let Some(value) = &state.global_filter else {
        return Vec::new();
    };
    // The global filter always matches on display strings, so text input
    // can hit numeric columns too.
    let matcher = FilterFn::IncludesString;
    if matcher.is_auto_removed(value) {
        return Vec::new();
    }
    columns
        .leaf_columns()
        .filter(|column| column.can_global_filter())
        .map(|column| ActiveFilter {
            column_id: column.id.clone(),
            matcher: matcher.clone(),
            value: value.clone(),
        })
        .collect()
}

/// The first leaf row's value for a column, used by `Auto` inference.
fn sample_value(input: &RowModel, columns: &ColumnSet, column_id: &str) -> Option<CellValue> {
    input
        .flat_rows()
        .iter()
        .find(|&&idx| !input.node(idx).is_grouped())
        .map(|&idx| columns.row_value(input, idx, column_id))
}

// ============================================================================
// TREE TRAVERSAL
// ============================================================================

/// A surviving row and the surviving part of its subtree.
struct Kept {
    idx: RowIdx,
    children: Vec<Kept>,
    /// Past the depth limit the whole subtree is carried unfiltered.
    unfiltered_subtree: bool,
}

fn decide_root_first(
    src: &RowModel,
    idx: RowIdx,
    depth: usize,
    max_depth: usize,
    passes: &impl Fn(RowIdx) -> bool,
) -> Option<Kept> {
    if depth >= max_depth {
        return passes(idx).then(|| Kept {
            idx,
            children: Vec::new(),
            unfiltered_subtree: true,
        });
    }
    let children: Vec<Kept> = src
        .node(idx)
        .children
        .iter()
        .filter_map(|&child| decide_root_first(src, child, depth + 1, max_depth, passes))
        .collect();
    if passes(idx) || !children.is_empty() {
        Some(Kept {
            idx,
            children,
            unfiltered_subtree: false,
        })
    } else {
        None
    }
}

fn decide_leaf_first(
    src: &RowModel,
    idx: RowIdx,
    passes: &impl Fn(RowIdx) -> bool,
) -> Option<Kept> {
    let children: Vec<Kept> = src
        .node(idx)
        .children
        .iter()
        .filter_map(|&child| decide_leaf_first(src, child, passes))
        .collect();
    if passes(idx) || !children.is_empty() {
        Some(Kept {
            idx,
            children,
            unfiltered_subtree: false,
        })
    } else {
        None
    }
}

fn emit(dst: &mut RowModel, src: &RowModel, kept: &Kept, parent: Option<RowIdx>) {
    if kept.unfiltered_subtree {
        dst.copy_subtree(src, kept.idx, parent);
        return;
    }
    let idx = dst.add_row(src.node(kept.idx).detached(), parent);
    for child in &kept.children {
        emit(dst, src, child, Some(idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use table_engine::{ColumnFilter, Record};
    use crate::core::build_core_model;
    use crate::definition::ColumnDef;

    fn setup(records: Vec<Record>) -> (RowModel, ColumnSet, TableConfig) {
        let config = TableConfig::new(vec![
            ColumnDef::new("name"),
            ColumnDef::new("status"),
            ColumnDef::new("amount"),
        ]);
        let columns = ColumnSet::build(&config.columns).unwrap();
        let records: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
        let model = build_core_model(&records, &config);
        (model, columns, config)
    }

    fn flat_records() -> Vec<Record> {
        vec![
            Record::new().with("name", "a").with("status", "Active").with("amount", 10.0),
            Record::new().with("name", "b").with("status", "Closed").with("amount", 20.0),
            Record::new().with("name", "c").with("status", "Active").with("amount", 30.0),
        ]
    }

    fn state_with_filter(id: &str, value: CellValue) -> TableState {
        let mut state = TableState::default();
        state.column_filters.push(ColumnFilter {
            id: id.to_string(),
            value,
        });
        state
    }

    #[test]
    fn test_column_filter_keeps_matches() {
        let (model, columns, config) = setup(flat_records());
        let state = state_with_filter("status", CellValue::text("Active"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "2"]);
    }

    #[test]
    fn test_filters_and_together() {
        let (model, columns, config) = setup(flat_records());
        let mut state = state_with_filter("status", CellValue::text("Active"));
        state.column_filters.push(ColumnFilter {
            id: "amount".to_string(),
            value: CellValue::List(vec![CellValue::number(25.0), CellValue::Empty]),
        });
        let filtered = filter_rows(&model, &columns, &state, &config);
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_vacuous_filter_is_skipped() {
        let (model, columns, config) = setup(flat_records());
        let state = state_with_filter("status", CellValue::text(""));
        assert!(!is_filtering_active(&model, &columns, &state, &config));
        let filtered = filter_rows(&model, &columns, &state, &config);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_unknown_named_filter_is_skipped() {
        let mut config = TableConfig::new(vec![
            ColumnDef::new("status").with_filter_fn(FilterFn::Named("bogus".to_string())),
        ]);
        config.enable_filters = true;
        let columns = ColumnSet::build(&config.columns).unwrap();
        let records: Vec<Arc<Record>> = flat_records().into_iter().map(Arc::new).collect();
        let model = build_core_model(&records, &config);

        let state = state_with_filter("status", CellValue::text("Active"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_global_filter_ors_across_columns() {
        let (model, columns, config) = setup(flat_records());
        let mut state = TableState::default();
        state.global_filter = Some(CellValue::text("b"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        // Matches "b" in the name column only.
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_filter_idempotence() {
        let (model, columns, config) = setup(flat_records());
        let state = state_with_filter("status", CellValue::text("Active"));
        let once = filter_rows(&model, &columns, &state, &config);
        let twice = filter_rows(&once, &columns, &state, &config);
        let a: Vec<&str> = once.iter_flat().map(|r| r.id.as_str()).collect();
        let b: Vec<&str> = twice.iter_flat().map(|r| r.id.as_str()).collect();
        assert_eq!(a, b);
    }

    fn tree_setup() -> (RowModel, ColumnSet, TableConfig) {
        use std::collections::BTreeMap;
        let mut active_child = BTreeMap::new();
        active_child.insert("name".to_string(), CellValue::text("child-a"));
        active_child.insert("status".to_string(), CellValue::text("Active"));
        let mut closed_child = BTreeMap::new();
        closed_child.insert("name".to_string(), CellValue::text("child-b"));
        closed_child.insert("status".to_string(), CellValue::text("Closed"));

        let records = vec![
            Record::new()
                .with("name", "parent")
                .with("status", "Closed")
                .with(
                    "kids",
                    CellValue::List(vec![
                        CellValue::Nested(active_child),
                        CellValue::Nested(closed_child),
                    ]),
                ),
            Record::new().with("name", "loner").with("status", "Closed"),
        ];

        let mut config = TableConfig::new(vec![
            ColumnDef::new("name"),
            ColumnDef::new("status"),
        ]);
        config.get_sub_rows = crate::definition::GetSubRows::Key("kids".to_string());
        let columns = ColumnSet::build(&config.columns).unwrap();
        let records: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
        let model = build_core_model(&records, &config);
        (model, columns, config)
    }

    #[test]
    fn test_root_first_keeps_parent_of_surviving_child() {
        let (model, columns, config) = tree_setup();
        let state = state_with_filter("status", CellValue::text("Active"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        // The parent fails but its Active child survives; the loner drops.
        assert_eq!(ids, vec!["0", "0.0"]);
        assert_eq!(filtered.row("0.0").unwrap().depth, 1);
    }

    #[test]
    fn test_leaf_first_matches_root_first_here() {
        let (model, columns, mut config) = tree_setup();
        config.tree_filter_policy = TreeFilterPolicy::LeafFirst;
        let state = state_with_filter("status", CellValue::text("Active"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "0.0"]);
    }

    #[test]
    fn test_depth_limit_keeps_subtrees_unfiltered() {
        let (model, columns, mut config) = tree_setup();
        config.max_leaf_row_filter_depth = 0;
        let state = state_with_filter("name", CellValue::text("parent"));
        let filtered = filter_rows(&model, &columns, &state, &config);
        // The parent passes at the limit, so both children come along.
        let ids: Vec<&str> = filtered.iter_flat().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "0.0", "0.1"]);
    }
}
