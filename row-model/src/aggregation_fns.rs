//! FILENAME: row-model/src/aggregation_fns.rs
//! Aggregation function registry - group-row cell values from leaf rows.
//!
//! Each aggregation receives the leaf values of the group (every ungrouped
//! descendant) and the direct-child values, and produces a single cell
//! value. `Auto` selects by column type: numbers sum, dates take their
//! extent, everything else aggregates to nothing.

use std::sync::Arc;
use table_engine::CellValue;

/// Signature of a caller-supplied aggregation:
/// (leaf values, direct child values) -> scalar.
pub type CustomAggregationFn =
    Arc<dyn Fn(&[CellValue], &[CellValue]) -> CellValue + Send + Sync>;

/// A column aggregation function.
#[derive(Clone)]
pub enum AggregationFn {
    /// Select by column type: Number -> Sum, Date -> Extent, else none.
    Auto,
    /// Numeric sum; non-numeric values coerce to 0.
    Sum,
    /// Smallest non-empty value (strict comparison).
    Min,
    /// Largest non-empty value.
    Max,
    /// Two-element list [min, max].
    Extent,
    /// Numeric mean over values that coerce to numbers.
    Mean,
    /// Numeric median; non-numeric input aggregates to Empty.
    Median,
    /// Distinct values in first-seen order.
    Unique,
    /// Number of distinct values.
    UniqueCount,
    /// Leaf row count.
    Count,
    /// Deferred registry lookup by name. Unknown names aggregate to
    /// nothing, with a diagnostic.
    Named(String),
    /// Caller-supplied aggregation.
    Custom(CustomAggregationFn),
}

impl std::fmt::Debug for AggregationFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for AggregationFn {
    fn default() -> Self {
        AggregationFn::Auto
    }
}

impl AggregationFn {
    /// Looks up an aggregation by registry name.
    pub fn from_name(name: &str) -> Option<AggregationFn> {
        match name {
            "auto" => Some(AggregationFn::Auto),
            "sum" => Some(AggregationFn::Sum),
            "min" => Some(AggregationFn::Min),
            "max" => Some(AggregationFn::Max),
            "extent" => Some(AggregationFn::Extent),
            "mean" => Some(AggregationFn::Mean),
            "median" => Some(AggregationFn::Median),
            "unique" => Some(AggregationFn::Unique),
            "uniqueCount" => Some(AggregationFn::UniqueCount),
            "count" => Some(AggregationFn::Count),
            _ => None,
        }
    }

    /// Registry name, for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            AggregationFn::Auto => "auto",
            AggregationFn::Sum => "sum",
            AggregationFn::Min => "min",
            AggregationFn::Max => "max",
            AggregationFn::Extent => "extent",
            AggregationFn::Mean => "mean",
            AggregationFn::Median => "median",
            AggregationFn::Unique => "unique",
            AggregationFn::UniqueCount => "uniqueCount",
            AggregationFn::Count => "count",
            AggregationFn::Named(name) => name,
            AggregationFn::Custom(_) => "custom",
        }
    }

    /// Resolves `Auto` against a sample value and `Named` against the
    /// registry. Returns None when the column has no applicable
    /// aggregation; the column's group cell stays empty.
    pub fn resolve(&self, sample: Option<&CellValue>) -> Option<AggregationFn> {
        match self {
            AggregationFn::Auto => {
                sample.and_then(Self::auto_for)
            }
            AggregationFn::Named(name) => match AggregationFn::from_name(name) {
                Some(AggregationFn::Auto) => sample.and_then(Self::auto_for),
                other => other,
            },
            other => Some(other.clone()),
        }
    }

    /// Chooses a concrete aggregation for `Auto` based on a sample value.
    /// Returns None when the column type has no default aggregation.
    pub fn auto_for(sample: &CellValue) -> Option<AggregationFn> {
        match sample {
            CellValue::Number(_) => Some(AggregationFn::Sum),
            CellValue::Date(_) => Some(AggregationFn::Extent),
            _ => None,
        }
    }

    /// Computes the aggregate over a group's leaf values.
    pub fn compute(&self, leaf_values: &[CellValue], child_values: &[CellValue]) -> CellValue {
        match self {
            // Unresolved selectors aggregate to nothing.
            AggregationFn::Auto | AggregationFn::Named(_) => CellValue::Empty,
            AggregationFn::Sum => {
                let sum: f64 = leaf_values.iter().map(|v| v.coerce_number()).sum();
                CellValue::number(sum)
            }
            AggregationFn::Min => min_value(leaf_values).unwrap_or(CellValue::Empty),
            AggregationFn::Max => max_value(leaf_values).unwrap_or(CellValue::Empty),
            AggregationFn::Extent => {
                match (min_value(leaf_values), max_value(leaf_values)) {
                    (Some(min), Some(max)) => CellValue::List(vec![min, max]),
                    _ => CellValue::Empty,
                }
            }
            AggregationFn::Mean => {
                let mut sum = 0.0;
                let mut count = 0u64;
                for v in leaf_values {
                    if let Some(n) = v.as_number() {
                        sum += n;
                        count += 1;
                    }
                }
                if count > 0 {
                    CellValue::number(sum / count as f64)
                } else {
                    CellValue::Empty
                }
            }
            AggregationFn::Median => {
                if leaf_values.is_empty() {
                    return CellValue::Empty;
                }
                let mut numbers = Vec::with_capacity(leaf_values.len());
                for v in leaf_values {
                    match v.as_number() {
                        Some(n) => numbers.push(n),
                        // Median is only defined over fully numeric input.
                        None => return CellValue::Empty,
                    }
                }
                numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = numbers.len() / 2;
                let median = if numbers.len() % 2 == 1 {
                    numbers[mid]
                } else {
                    (numbers[mid - 1] + numbers[mid]) / 2.0
                };
                CellValue::number(median)
            }
            AggregationFn::Unique => CellValue::List(unique_values(leaf_values)),
            AggregationFn::UniqueCount => {
                CellValue::number(unique_values(leaf_values).len() as f64)
            }
            AggregationFn::Count => CellValue::number(leaf_values.len() as f64),
            AggregationFn::Custom(f) => f(leaf_values, child_values),
        }
    }
}

/// Smallest non-empty value, by the total value order. None if all empty.
fn min_value(values: &[CellValue]) -> Option<CellValue> {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .min_by(|a, b| a.compare(b))
        .cloned()
}

/// Largest non-empty value. None if all empty.
fn max_value(values: &[CellValue]) -> Option<CellValue> {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .max_by(|a, b| a.compare(b))
        .cloned()
}

/// Distinct values in first-seen order.
fn unique_values(values: &[CellValue]) -> Vec<CellValue> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v.clone()) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(ns: &[f64]) -> Vec<CellValue> {
        ns.iter().map(|&n| CellValue::number(n)).collect()
    }

    #[test]
    fn test_aggregates_over_one_to_four() {
        let values = numbers(&[1.0, 2.0, 3.0, 4.0]);
        let none: &[CellValue] = &[];

        assert_eq!(
            AggregationFn::Sum.compute(&values, none),
            CellValue::number(10.0)
        );
        assert_eq!(
            AggregationFn::Mean.compute(&values, none),
            CellValue::number(2.5)
        );
        assert_eq!(
            AggregationFn::Median.compute(&values, none),
            CellValue::number(2.5)
        );
        assert_eq!(
            AggregationFn::Min.compute(&values, none),
            CellValue::number(1.0)
        );
        assert_eq!(
            AggregationFn::Max.compute(&values, none),
            CellValue::number(4.0)
        );
        assert_eq!(
            AggregationFn::Count.compute(&values, none),
            CellValue::number(4.0)
        );
        assert_eq!(
            AggregationFn::UniqueCount.compute(&values, none),
            CellValue::number(4.0)
        );
    }

    #[test]
    fn test_sum_coerces_non_numeric_to_zero() {
        let values = vec![
            CellValue::number(5.0),
            CellValue::text("oops"),
            CellValue::number(3.0),
        ];
        assert_eq!(
            AggregationFn::Sum.compute(&values, &[]),
            CellValue::number(8.0)
        );
    }

    #[test]
    fn test_median_odd_count() {
        let values = numbers(&[9.0, 1.0, 5.0]);
        assert_eq!(
            AggregationFn::Median.compute(&values, &[]),
            CellValue::number(5.0)
        );
    }

    #[test]
    fn test_median_rejects_non_numeric() {
        let values = vec![CellValue::number(1.0), CellValue::text("x")];
        assert_eq!(AggregationFn::Median.compute(&values, &[]), CellValue::Empty);
    }

    #[test]
    fn test_min_max_skip_empty() {
        let values = vec![
            CellValue::Empty,
            CellValue::number(7.0),
            CellValue::Empty,
            CellValue::number(3.0),
        ];
        assert_eq!(
            AggregationFn::Min.compute(&values, &[]),
            CellValue::number(3.0)
        );
        assert_eq!(
            AggregationFn::Max.compute(&values, &[]),
            CellValue::number(7.0)
        );
    }

    #[test]
    fn test_extent() {
        let values = numbers(&[4.0, 1.0, 9.0]);
        assert_eq!(
            AggregationFn::Extent.compute(&values, &[]),
            CellValue::List(vec![CellValue::number(1.0), CellValue::number(9.0)])
        );
    }

    #[test]
    fn test_unique_first_seen_order() {
        let values = vec![
            CellValue::text("b"),
            CellValue::text("a"),
            CellValue::text("b"),
        ];
        assert_eq!(
            AggregationFn::Unique.compute(&values, &[]),
            CellValue::List(vec![CellValue::text("b"), CellValue::text("a")])
        );
    }

    #[test]
    fn test_auto_selection() {
        assert!(matches!(
            AggregationFn::auto_for(&CellValue::number(1.0)),
            Some(AggregationFn::Sum)
        ));
        assert!(matches!(
            AggregationFn::auto_for(&CellValue::Date(0)),
            Some(AggregationFn::Extent)
        ));
        assert!(AggregationFn::auto_for(&CellValue::text("x")).is_none());
    }

    #[test]
    fn test_registry_lookup() {
        assert!(AggregationFn::from_name("sum").is_some());
        assert!(AggregationFn::from_name("uniqueCount").is_some());
        assert!(AggregationFn::from_name("nope").is_none());
    }

    #[test]
    fn test_named_resolution() {
        let named = AggregationFn::Named("median".to_string());
        assert!(matches!(
            named.resolve(Some(&CellValue::number(1.0))),
            Some(AggregationFn::Median)
        ));
        let unknown = AggregationFn::Named("nope".to_string());
        assert!(unknown.resolve(Some(&CellValue::number(1.0))).is_none());
    }
}
