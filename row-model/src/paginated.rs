//! FILENAME: row-model/src/paginated.rs
//! Pagination stage - windowed slicing over the expanded model.
//!
//! The default slices top-level rows and lets each retained row keep its
//! visible subtree. With `paginate_expanded_rows` off, the expanded flat
//! sequence is sliced instead and a tree is rebuilt from the slice, so
//! expanded descendants consume page capacity like top-level rows.

use rustc_hash::FxHashMap;
use table_engine::{PaginationState, RowIdx, RowModel};
use crate::definition::TableConfig;

/// Applies the pagination window to `input` (the expanded model).
pub fn paginate_rows(
    input: &RowModel,
    pagination: &PaginationState,
    config: &TableConfig,
) -> RowModel {
    let page_index = clamped_page_index(input, pagination, config);
    let start = page_index * pagination.page_size;
    let end = start + pagination.page_size;

    let mut output = RowModel::new();
    if config.paginate_expanded_rows {
        for &top in input
            .top_rows()
            .iter()
            .skip(start)
            .take(pagination.page_size)
        {
            output.copy_subtree(input, top, None);
        }
    } else {
        // Slice the flat visible sequence, then re-parent: a sliced row
        // whose parent fell outside the window becomes top-level.
        let mut remapped: FxHashMap<RowIdx, RowIdx> = FxHashMap::default();
        for &idx in input.flat_rows().iter().skip(start).take(end - start) {
            let parent = input
                .node(idx)
                .parent
                .and_then(|p| remapped.get(&p).copied());
            let new_idx = output.add_row(input.node(idx).detached(), parent);
            remapped.insert(idx, new_idx);
        }
    }
    output.finish();
    output
}

/// Number of pages for the current state. A manual count wins; otherwise
/// it is derived from the row count and page size.
pub fn page_count(input: &RowModel, pagination: &PaginationState, config: &TableConfig) -> usize {
    if let Some(count) = config.page_count {
        return count;
    }
    let row_count = config.row_count.unwrap_or_else(|| paged_row_count(input, config));
    if pagination.page_size == 0 {
        return 0;
    }
    row_count.div_ceil(pagination.page_size)
}

/// The page index clamped to the valid range for the current page count.
pub fn clamped_page_index(
    input: &RowModel,
    pagination: &PaginationState,
    config: &TableConfig,
) -> usize {
    let pages = page_count(input, pagination, config);
    pagination.page_index.min(pages.saturating_sub(1))
}

fn paged_row_count(input: &RowModel, config: &TableConfig) -> usize {
    if config.paginate_expanded_rows {
        input.top_len()
    } else {
        input.len()
    }
}
