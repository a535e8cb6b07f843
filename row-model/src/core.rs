//! FILENAME: row-model/src/core.rs
//! Core Row Model - raw records turned into the initial row tree.
//!
//! The first pipeline stage. Assigns row identity (caller scheme or the
//! `parentId.index` composite), extracts sub-rows for hierarchical data,
//! and produces the model every later stage derives from.

use std::sync::Arc;
use table_engine::{Record, RowId, RowModel, RowNode};
use crate::definition::{GetRowId, GetSubRows, TableConfig};

/// Builds the core model from the caller's records.
pub fn build_core_model(records: &[Arc<Record>], config: &TableConfig) -> RowModel {
    let mut model = RowModel::new();
    for (index, record) in records.iter().enumerate() {
        add_record(&mut model, config, Arc::clone(record), index, None, None);
    }
    model.finish();
    model
}

fn add_record(
    model: &mut RowModel,
    config: &TableConfig,
    record: Arc<Record>,
    index: usize,
    parent: Option<usize>,
    parent_id: Option<&str>,
) {
    let id = row_id(config, &record, index, parent_id);
    let sub_records = sub_records(config, &record);
    let idx = model.add_row(RowNode::new(id.clone(), index, record), parent);
    for (child_index, child) in sub_records.into_iter().enumerate() {
        add_record(
            model,
            config,
            Arc::new(child),
            child_index,
            Some(idx),
            Some(&id),
        );
    }
}

/// Assigns a row id. The default composite is the sibling index prefixed
/// with the parent's id; a key scheme with an empty value falls back to
/// the composite so ids stay unique.
fn row_id(config: &TableConfig, record: &Record, index: usize, parent_id: Option<&str>) -> RowId {
    let composite = match parent_id {
        Some(p) => format!("{}.{}", p, index),
        None => index.to_string(),
    };
    match &config.get_row_id {
        GetRowId::Index => composite,
        GetRowId::Key(key) => {
            let value = record.get(key);
            if value.is_empty() {
                composite
            } else {
                value.display()
            }
        }
        GetRowId::Func(f) => f(record, index, parent_id),
    }
}

fn sub_records(config: &TableConfig, record: &Record) -> Vec<Record> {
    match &config.get_sub_rows {
        GetSubRows::None => Vec::new(),
        GetSubRows::Key(key) => match record.get(key) {
            table_engine::CellValue::List(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    table_engine::CellValue::Nested(map) => Some(Record::from(map)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        GetSubRows::Func(f) => f(record),
    }
}
