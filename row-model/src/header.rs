//! FILENAME: row-model/src/header.rs
//! Header groups - visible leaves banded into spanning header rows.
//!
//! Presentation structure only. Rebuilt whenever column order, visibility
//! or pinning changes; one `HeaderGroup` per definition depth, leaves on
//! the bottom band, group headers spanning their visible leaves above,
//! placeholders filling the gap over shallow columns.

use serde::Serialize;
use table_engine::ColumnId;
use crate::column::ColumnSet;

/// One header cell in a header band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Unique id within the band set.
    pub id: String,
    /// The column this header stands for. For a placeholder, the topmost
    /// real ancestor of the leaves below it.
    pub column_id: ColumnId,
    /// Number of visible leaf columns this header spans.
    pub col_span: usize,
    /// True when this cell only fills space above a shallow column.
    pub is_placeholder: bool,
}

/// One band (row) of headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderGroup {
    /// Band index, 0 at the top.
    pub depth: usize,
    pub headers: Vec<Header>,
}

/// Builds the header bands over the given visible leaves, in order.
///
/// Each leaf contributes one cell per band: itself on the bottom band,
/// its ancestors above, placeholders above its topmost ancestor. Adjacent
/// cells for the same group column merge by extending `col_span`.
pub fn build_header_groups(set: &ColumnSet, visible_leaf_ids: &[ColumnId]) -> Vec<HeaderGroup> {
    // Ancestor chains, leaf first.
    let chains: Vec<Vec<ColumnId>> = visible_leaf_ids
        .iter()
        .map(|id| ancestor_chain(set, id))
        .collect();
    let band_count = chains.iter().map(Vec::len).max().unwrap_or(0);

    let mut groups = Vec::with_capacity(band_count);
    for band in 0..band_count {
        let mut headers: Vec<Header> = Vec::new();
        for chain in &chains {
            // Position within the chain, counting up from the leaf.
            let from_bottom = band_count - 1 - band;
            let (column_id, is_placeholder) = match chain.get(from_bottom) {
                Some(id) => (id.clone(), false),
                // Band above the chain's topmost ancestor.
                None => (chain.last().cloned().unwrap_or_default(), true),
            };

            match headers.last_mut() {
                Some(prev)
                    if !is_placeholder
                        && !prev.is_placeholder
                        && prev.column_id == column_id =>
                {
                    prev.col_span += 1;
                }
                _ => {
                    headers.push(Header {
                        id: format!("{}_{}", band, column_id),
                        column_id,
                        col_span: 1,
                        is_placeholder,
                    });
                }
            }
        }
        groups.push(HeaderGroup {
            depth: band,
            headers,
        });
    }
    groups
}

fn ancestor_chain(set: &ColumnSet, leaf_id: &str) -> Vec<ColumnId> {
    let mut chain = vec![leaf_id.to_string()];
    let mut current = leaf_id.to_string();
    while let Some(col) = set.get(&current) {
        match &col.parent {
            Some(parent) => {
                chain.push(parent.clone());
                current = parent.clone();
            }
            None => break,
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ColumnDef;

    fn grouped_set() -> ColumnSet {
        ColumnSet::build(&[
            ColumnDef::group(
                "Name",
                vec![ColumnDef::new("first"), ColumnDef::new("last")],
            ),
            ColumnDef::new("status"),
        ])
        .unwrap()
    }

    fn ids(leaf_ids: &[&str]) -> Vec<ColumnId> {
        leaf_ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_spans_its_leaves() {
        let set = grouped_set();
        let groups = build_header_groups(&set, &ids(&["first", "last", "status"]));
        assert_eq!(groups.len(), 2);

        let top = &groups[0].headers;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].column_id, "Name");
        assert_eq!(top[0].col_span, 2);
        assert!(!top[0].is_placeholder);
        assert_eq!(top[1].column_id, "status");
        assert!(top[1].is_placeholder);

        let bottom = &groups[1].headers;
        assert_eq!(bottom.len(), 3);
        assert!(bottom.iter().all(|h| h.col_span == 1 && !h.is_placeholder));
    }

    #[test]
    fn test_flat_columns_make_one_band() {
        let set = ColumnSet::build(&[ColumnDef::new("a"), ColumnDef::new("b")]).unwrap();
        let groups = build_header_groups(&set, &ids(&["a", "b"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].headers.len(), 2);
    }

    #[test]
    fn test_split_group_does_not_merge_across_gap() {
        let set = grouped_set();
        // "status" ordered between the two Name leaves.
        let groups = build_header_groups(&set, &ids(&["first", "status", "last"]));
        let top = &groups[0].headers;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].column_id, "Name");
        assert_eq!(top[0].col_span, 1);
        assert_eq!(top[2].column_id, "Name");
        assert_eq!(top[2].col_span, 1);
    }

    #[test]
    fn test_hidden_leaf_shrinks_span() {
        let set = grouped_set();
        let groups = build_header_groups(&set, &ids(&["first", "status"]));
        let top = &groups[0].headers;
        assert_eq!(top[0].column_id, "Name");
        assert_eq!(top[0].col_span, 1);
    }

    #[test]
    fn test_no_leaves_no_bands() {
        let set = grouped_set();
        assert!(build_header_groups(&set, &[]).is_empty());
    }
}
