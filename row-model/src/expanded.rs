//! FILENAME: row-model/src/expanded.rs
//! Expansion stage - collapsed subtrees pruned from the visible model.
//!
//! The expanded model contains exactly the rows a renderer shows: every
//! top-level row, and the children of each expanded row, recursively.
//! Collapsed subtrees stay in the upstream model; here they are simply
//! absent, so the model invariants (flat/by-id mirror the tree) keep
//! holding for the visible set.

use table_engine::{ExpandedState, RowIdx, RowModel};

/// Prunes collapsed subtrees out of `input`.
pub fn expand_rows(input: &RowModel, expanded: &ExpandedState) -> RowModel {
    let mut output = RowModel::new();
    for &top in input.top_rows() {
        emit_visible(&mut output, input, top, expanded, None);
    }
    output.finish();
    output
}

fn emit_visible(
    dst: &mut RowModel,
    src: &RowModel,
    idx: RowIdx,
    expanded: &ExpandedState,
    parent: Option<RowIdx>,
) {
    let node = src.node(idx);
    let new_idx = dst.add_row(node.detached(), parent);
    if node.has_children() && expanded.is_expanded(&node.id) {
        for &child in &node.children {
            emit_visible(dst, src, child, expanded, Some(new_idx));
        }
    }
}
