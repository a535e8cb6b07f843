//! FILENAME: table-engine/src/value.rs
//! Cell values and records - the normalized data the row models operate on.
//!
//! Every value flowing through the pipeline is normalized into `CellValue`:
//! - Hashable (for unique-value aggregation and grouping keys)
//! - Totally ordered (for the fallback comparator)
//! - Serializable (records can be loaded from JSON fixtures)
//!
//! Records are immutable from the pipeline's point of view: stages share
//! them via `Arc` and never write through.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

// ============================================================================
// CELL VALUE
// ============================================================================

/// A normalized, hashable cell value.
///
/// `Date` stores milliseconds since the Unix epoch. `List` backs array-typed
/// columns (containment filters); `Nested` backs dotted-path accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Bool(bool),
    Date(i64),
    List(Vec<CellValue>),
    Nested(BTreeMap<String, CellValue>),
}

impl CellValue {
    pub fn number(n: f64) -> Self {
        CellValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Returns true if this value is `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces this value to f64 the way `sum` aggregation does:
    /// numbers pass through, everything else becomes 0.
    pub fn coerce_number(&self) -> f64 {
        match self {
            CellValue::Number(n) => n.as_f64(),
            _ => 0.0,
        }
    }

    /// Display string used for loose (weak) equality and labels.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format!("{}", n.as_f64()),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Date(ms) => format!("{}", ms),
            CellValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.display()).collect();
                parts.join(", ")
            }
            CellValue::Nested(_) => "(object)".to_string(),
        }
    }

    /// Total order over cell values, used as the fallback comparator.
    /// Variant order: Empty < Number < Date < Text < Bool < List < Nested.
    pub fn compare(&self, other: &CellValue) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Less,
            (_, CellValue::Empty) => Ordering::Greater,

            (CellValue::Number(na), CellValue::Number(nb)) => {
                na.0.partial_cmp(&nb.0).unwrap_or(Ordering::Equal)
            }
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,

            (CellValue::Date(da), CellValue::Date(db)) => da.cmp(db),
            (CellValue::Date(_), _) => Ordering::Less,
            (_, CellValue::Date(_)) => Ordering::Greater,

            (CellValue::Text(ta), CellValue::Text(tb)) => ta.cmp(tb),
            (CellValue::Text(_), _) => Ordering::Less,
            (_, CellValue::Text(_)) => Ordering::Greater,

            (CellValue::Bool(ba), CellValue::Bool(bb)) => ba.cmp(bb),
            (CellValue::Bool(_), _) => Ordering::Less,
            (_, CellValue::Bool(_)) => Ordering::Greater,

            (CellValue::List(la), CellValue::List(lb)) => {
                for (a, b) in la.iter().zip(lb.iter()) {
                    let ord = a.compare(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                la.len().cmp(&lb.len())
            }
            (CellValue::List(_), _) => Ordering::Less,
            (_, CellValue::List(_)) => Ordering::Greater,

            (CellValue::Nested(ma), CellValue::Nested(mb)) => {
                ma.len().cmp(&mb.len())
            }
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(OrderedFloat(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One raw data record, as supplied by the caller.
///
/// Values are keyed by field name; nested objects are `CellValue::Nested`
/// and reachable through dotted-path accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insertion, for fixtures and tests.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        self.values.insert(key.into(), value);
    }

    /// Gets a value by plain key. Missing keys read as `Empty`.
    pub fn get(&self, key: &str) -> CellValue {
        self.values.get(key).cloned().unwrap_or(CellValue::Empty)
    }

    /// Gets a value by dotted path (e.g. "address.city"), descending
    /// through `Nested` values. Any missing segment reads as `Empty`.
    pub fn get_path(&self, path: &str) -> CellValue {
        let mut segments = path.split('.');
        let first = match segments.next() {
            Some(s) => s,
            None => return CellValue::Empty,
        };
        let mut current = match self.values.get(first) {
            Some(v) => v.clone(),
            None => return CellValue::Empty,
        };
        for segment in segments {
            current = match current {
                CellValue::Nested(map) => match map.get(segment) {
                    Some(v) => v.clone(),
                    None => return CellValue::Empty,
                },
                _ => return CellValue::Empty,
            };
        }
        current
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl From<BTreeMap<String, CellValue>> for Record {
    fn from(values: BTreeMap<String, CellValue>) -> Self {
        Record { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_ordered_float_nan_equality() {
        assert_eq!(OrderedFloat(f64::NAN), OrderedFloat(f64::NAN));
        assert_ne!(OrderedFloat(1.0), OrderedFloat(2.0));
        assert_eq!(OrderedFloat(1.5), OrderedFloat(1.5));
    }

    #[test]
    fn test_compare_variant_order() {
        let empty = CellValue::Empty;
        let num = CellValue::number(1.0);
        let date = CellValue::Date(0);
        let text = CellValue::text("a");
        let boolean = CellValue::Bool(false);

        assert_eq!(empty.compare(&num), Ordering::Less);
        assert_eq!(num.compare(&date), Ordering::Less);
        assert_eq!(date.compare(&text), Ordering::Less);
        assert_eq!(text.compare(&boolean), Ordering::Less);
        assert_eq!(boolean.compare(&empty), Ordering::Greater);
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(
            CellValue::number(1.0).compare(&CellValue::number(2.0)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::number(2.0).compare(&CellValue::number(2.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_record_get_path() {
        let mut address = BTreeMap::new();
        address.insert("city".to_string(), CellValue::text("Oslo"));
        let record = Record::new()
            .with("name", "Ada")
            .with("address", CellValue::Nested(address));

        assert_eq!(record.get_path("name"), CellValue::text("Ada"));
        assert_eq!(record.get_path("address.city"), CellValue::text("Oslo"));
        assert_eq!(record.get_path("address.zip"), CellValue::Empty);
        assert_eq!(record.get_path("missing.anything"), CellValue::Empty);
    }

    #[test]
    fn test_record_missing_key_is_empty() {
        let record = Record::new().with("a", 1.0);
        assert_eq!(record.get("b"), CellValue::Empty);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(CellValue::number(2.5).coerce_number(), 2.5);
        assert_eq!(CellValue::text("2.5").coerce_number(), 0.0);
        assert_eq!(CellValue::Empty.coerce_number(), 0.0);
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = Record::new().with("region", "North").with("sales", 120.0);
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
