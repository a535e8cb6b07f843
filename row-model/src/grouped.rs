//! FILENAME: row-model/src/grouped.rs
//! Grouping stage - rows collapsed into group rows with aggregated cells.
//!
//! Each grouping key adds one nesting level: rows sharing that key's
//! value collapse under a group row whose children are the next level,
//! or the original rows at the innermost level. Group row ids encode
//! their path (`columnId:value>columnId:value...`) so they stay stable
//! across refilters. Aggregates for the non-grouped columns are computed
//! bottom-up from each group's ungrouped descendants.

use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use table_engine::{CellValue, ColumnId, RowIdx, RowModel, RowNode, TableState};
use crate::column::{Column, ColumnSet};
use crate::definition::TableConfig;

/// Groups `input`'s top-level rows by the state's grouping columns.
pub fn group_rows(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> RowModel {
    let keys = resolve_grouping_columns(columns, state, config);

    let mut output = RowModel::new();
    if keys.is_empty() {
        for &top in input.top_rows() {
            output.copy_subtree(input, top, None);
        }
    } else {
        let top: Vec<RowIdx> = input.top_rows().to_vec();
        group_level(&mut output, input, &top, &keys, 0, None, "");
    }
    output.finish();
    compute_aggregates(&mut output, columns);
    output
}

/// Grouping columns that exist and allow grouping, in state order.
pub fn resolve_grouping_columns<'a>(
    columns: &'a ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> Vec<&'a Column> {
    if !config.enable_grouping {
        return Vec::new();
    }
    let mut keys = Vec::new();
    for id in &state.grouping {
        match columns.get(id) {
            Some(column) if column.can_group() => keys.push(column),
            Some(_) => warn!("column '{}' is not groupable, skipping its grouping", id),
            None => warn!("grouping targets unknown column '{}', skipping", id),
        }
    }
    keys
}

fn group_level(
    dst: &mut RowModel,
    src: &RowModel,
    rows: &[RowIdx],
    keys: &[&Column],
    level: usize,
    parent: Option<RowIdx>,
    id_prefix: &str,
) {
    if level == keys.len() {
        for &row in rows {
            dst.copy_subtree(src, row, parent);
        }
        return;
    }

    let column = keys[level];
    // Buckets in first-seen order, keyed by the grouped value's display.
    let mut order: Vec<(String, CellValue)> = Vec::new();
    let mut buckets: FxHashMap<String, SmallVec<[RowIdx; 8]>> = FxHashMap::default();
    for &row in rows {
        let value = column
            .def
            .accessor
            .value_of(&src.node(row).original);
        let key = value.display();
        if !buckets.contains_key(&key) {
            order.push((key.clone(), value));
        }
        buckets.entry(key).or_default().push(row);
    }

    for (position, (key, value)) in order.into_iter().enumerate() {
        let members = &buckets[&key];
        let group_id = format!("{}{}:{}", id_prefix, column.id, key);

        let mut node = RowNode::new(
            group_id.clone(),
            position,
            Arc::clone(&src.node(members[0]).original),
        );
        node.grouping_column = Some(column.id.clone());
        node.grouping_value = Some(value);
        let group_idx = dst.add_row(node, parent);

        let child_prefix = format!("{}>", group_id);
        group_level(
            dst,
            src,
            members,
            keys,
            level + 1,
            Some(group_idx),
            &child_prefix,
        );
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Fills every group row's aggregate map. Walks the flat sequence in
/// reverse so child group rows are aggregated before their parents read
/// them as direct-child values.
fn compute_aggregates(model: &mut RowModel, columns: &ColumnSet) {
    let flat: Vec<RowIdx> = model.flat_rows().to_vec();
    for &idx in flat.iter().rev() {
        if !model.node(idx).is_grouped() {
            continue;
        }
        let mut leaves = Vec::new();
        collect_ungrouped_descendants(model, idx, &mut leaves);

        let grouping_column = model.node(idx).grouping_column.clone();
        let children = model.node(idx).children.clone();

        let mut computed: Vec<(ColumnId, CellValue)> = Vec::new();
        for column in columns.leaf_columns() {
            if grouping_column.as_deref() == Some(column.id.as_str()) {
                continue;
            }
            let leaf_values: Vec<CellValue> = leaves
                .iter()
                .map(|&leaf| columns.row_value(model, leaf, &column.id))
                .collect();
            let resolved = column.def.aggregation_fn.resolve(leaf_values.first());
            let Some(agg) = resolved else {
                if matches!(
                    column.def.aggregation_fn,
                    crate::aggregation_fns::AggregationFn::Named(_)
                ) {
                    warn!(
                        "unknown aggregation function '{}' on column '{}', skipping",
                        column.def.aggregation_fn.name(),
                        column.id
                    );
                }
                continue;
            };
            let child_values: Vec<CellValue> = children
                .iter()
                .map(|&child| columns.row_value(model, child, &column.id))
                .collect();
            computed.push((column.id.clone(), agg.compute(&leaf_values, &child_values)));
        }

        let node = model.node_mut(idx);
        for (id, value) in computed {
            node.aggregates.insert(id, value);
        }
    }
}

fn collect_ungrouped_descendants(model: &RowModel, idx: RowIdx, out: &mut Vec<RowIdx>) {
    for &child in &model.node(idx).children {
        if !model.node(child).is_grouped() {
            out.push(child);
        }
        collect_ungrouped_descendants(model, child, out);
    }
}
