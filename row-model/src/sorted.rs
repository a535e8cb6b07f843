//! FILENAME: row-model/src/sorted.rs
//! Sorting stage - the multi-criterion comparator chain.
//!
//! Criteria apply in list order; the first nonzero comparison wins and a
//! full tie falls back to the original row index, so the sort is a stable
//! total order. Every subtree level is sorted independently with the same
//! chain. Criteria naming unknown or non-sortable columns are dropped
//! with a diagnostic.

use log::warn;
use std::cmp::Ordering;
use table_engine::{CellValue, RowIdx, RowModel, TableState};
use crate::column::{Column, ColumnSet};
use crate::definition::{SortUndefined, TableConfig};
use crate::sorting_fns::SortingFn;

/// How many rows `Auto` probes when choosing a comparator.
const AUTO_SAMPLE_ROWS: usize = 10;

/// One criterion after resolution.
struct ActiveSort<'a> {
    column: &'a Column,
    comparator: SortingFn,
    desc: bool,
}

/// Sorts every sibling list of `input` by the state's criteria.
pub fn sort_rows(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> RowModel {
    let chain = resolve_sorts(input, columns, state, config);

    let mut output = RowModel::new();
    if chain.is_empty() || input.len() <= 1 {
        for &top in input.top_rows() {
            output.copy_subtree(input, top, None);
        }
    } else {
        let top: Vec<RowIdx> = input.top_rows().to_vec();
        emit_sorted(&mut output, input, top, &chain, columns, None);
    }
    output.finish();
    output
}

/// Returns true if any criterion would actually run against `input`.
pub fn is_sorting_active(
    input: &RowModel,
    columns: &ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> bool {
    !resolve_sorts(input, columns, state, config).is_empty()
}

fn resolve_sorts<'a>(
    input: &RowModel,
    columns: &'a ColumnSet,
    state: &TableState,
    config: &TableConfig,
) -> Vec<ActiveSort<'a>> {
    if !config.enable_sorting {
        return Vec::new();
    }
    let mut chain = Vec::new();
    for sort in &state.sorting {
        let Some(column) = columns.get(&sort.id) else {
            warn!("sort criterion targets unknown column '{}', skipping", sort.id);
            continue;
        };
        if !column.can_sort() {
            warn!("column '{}' is not sortable, skipping its criterion", sort.id);
            continue;
        }
        let samples: Vec<CellValue> = input
            .flat_rows()
            .iter()
            .take(AUTO_SAMPLE_ROWS)
            .map(|&idx| columns.row_value(input, idx, &sort.id))
            .collect();
        let Some(comparator) = column.def.sorting_fn.resolve(samples.iter()) else {
            warn!(
                "unknown sorting function '{}' on column '{}', skipping",
                column.def.sorting_fn.name(),
                sort.id
            );
            continue;
        };
        chain.push(ActiveSort {
            column,
            comparator,
            desc: sort.desc,
        });
    }
    chain
}

fn emit_sorted(
    dst: &mut RowModel,
    src: &RowModel,
    mut siblings: Vec<RowIdx>,
    chain: &[ActiveSort],
    columns: &ColumnSet,
    parent: Option<RowIdx>,
) {
    siblings.sort_by(|&a, &b| compare_rows(src, columns, chain, a, b));
    for idx in siblings {
        let new_idx = dst.add_row(src.node(idx).detached(), parent);
        let children = src.node(idx).children.clone();
        emit_sorted(dst, src, children, chain, columns, Some(new_idx));
    }
}

fn compare_rows(
    model: &RowModel,
    columns: &ColumnSet,
    chain: &[ActiveSort],
    a: RowIdx,
    b: RowIdx,
) -> Ordering {
    for sort in chain {
        let va = columns.row_value(model, a, &sort.column.id);
        let vb = columns.row_value(model, b, &sort.column.id);

        let ord = match sort.column.def.sort_undefined {
            // Empties pin to one end regardless of direction.
            SortUndefined::First => match (va.is_empty(), vb.is_empty()) {
                (true, true) => continue,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => sort.comparator.compare(&va, &vb),
            },
            SortUndefined::Last => match (va.is_empty(), vb.is_empty()) {
                (true, true) => continue,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) => sort.comparator.compare(&va, &vb),
            },
            SortUndefined::Tiebreak => {
                if va.is_empty() && vb.is_empty() {
                    continue;
                }
                sort.comparator.compare(&va, &vb)
            }
        };

        let mut ord = if sort.desc { ord.reverse() } else { ord };
        if sort.column.def.invert_sorting {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Full tie: original order.
    model.node(a).index.cmp(&model.node(b).index)
}
