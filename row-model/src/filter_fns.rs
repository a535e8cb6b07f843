//! FILENAME: row-model/src/filter_fns.rs
//! Filter function registry - named matchers plus "auto" inference.
//!
//! A column filter resolves to one of these matchers: an explicit variant,
//! a registry name (the camelCase names the configuration layer uses), or
//! `Auto`, which probes the first leaf row's value type. Each matcher also
//! knows when a filter value is vacuous (`is_auto_removed`), in which case
//! the filter is treated as "not filtering" and skipped entirely.

use std::sync::Arc;
use table_engine::CellValue;

/// Signature of a caller-supplied matcher: (row value, filter value) -> keep.
pub type CustomFilterFn = Arc<dyn Fn(&CellValue, &CellValue) -> bool + Send + Sync>;

/// A column filter matching function.
#[derive(Clone)]
pub enum FilterFn {
    /// Infer from the first leaf row's value type.
    Auto,
    /// Case-insensitive substring match.
    IncludesString,
    /// Case-sensitive substring match.
    IncludesStringSensitive,
    /// Case-insensitive whole-string equality.
    EqualsString,
    /// List value contains the filter value.
    ArrIncludes,
    /// List value contains every element of the filter list.
    ArrIncludesAll,
    /// List value contains at least one element of the filter list.
    ArrIncludesSome,
    /// Strict value equality.
    Equals,
    /// Loose equality on display strings.
    WeakEquals,
    /// Numeric value within an inclusive [min, max] range.
    InNumberRange,
    /// Deferred registry lookup by name. Unknown names resolve to nothing
    /// and the filter is skipped with a diagnostic.
    Named(String),
    /// Caller-supplied matcher.
    Custom(CustomFilterFn),
}

impl std::fmt::Debug for FilterFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for FilterFn {
    fn default() -> Self {
        FilterFn::Auto
    }
}

impl FilterFn {
    /// Looks up a matcher by registry name. Unknown names return None;
    /// the caller skips the filter with a diagnostic.
    pub fn from_name(name: &str) -> Option<FilterFn> {
        match name {
            "auto" => Some(FilterFn::Auto),
            "includesString" => Some(FilterFn::IncludesString),
            "includesStringSensitive" => Some(FilterFn::IncludesStringSensitive),
            "equalsString" => Some(FilterFn::EqualsString),
            "arrIncludes" => Some(FilterFn::ArrIncludes),
            "arrIncludesAll" => Some(FilterFn::ArrIncludesAll),
            "arrIncludesSome" => Some(FilterFn::ArrIncludesSome),
            "equals" => Some(FilterFn::Equals),
            "weakEquals" => Some(FilterFn::WeakEquals),
            "inNumberRange" => Some(FilterFn::InNumberRange),
            _ => None,
        }
    }

    /// Registry name, for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            FilterFn::Auto => "auto",
            FilterFn::IncludesString => "includesString",
            FilterFn::IncludesStringSensitive => "includesStringSensitive",
            FilterFn::EqualsString => "equalsString",
            FilterFn::ArrIncludes => "arrIncludes",
            FilterFn::ArrIncludesAll => "arrIncludesAll",
            FilterFn::ArrIncludesSome => "arrIncludesSome",
            FilterFn::Equals => "equals",
            FilterFn::WeakEquals => "weakEquals",
            FilterFn::InNumberRange => "inNumberRange",
            FilterFn::Named(name) => name,
            FilterFn::Custom(_) => "custom",
        }
    }

    /// Chooses a concrete matcher for `Auto` based on a sample row value.
    /// Type inference reads the value's variant, never its content: the
    /// text "42" stays a substring match, not a number range.
    pub fn auto_for(sample: &CellValue) -> FilterFn {
        match sample {
            CellValue::Text(_) => FilterFn::IncludesString,
            CellValue::Number(_) => FilterFn::InNumberRange,
            CellValue::Bool(_) => FilterFn::Equals,
            CellValue::List(_) => FilterFn::ArrIncludes,
            CellValue::Date(_) => FilterFn::Equals,
            CellValue::Nested(_) => FilterFn::Equals,
            CellValue::Empty => FilterFn::WeakEquals,
        }
    }

    /// Resolves `Auto` against a sample value and `Named` against the
    /// registry. Returns None when a name is unknown; the caller skips the
    /// filter with a diagnostic.
    pub fn resolve(&self, sample: Option<&CellValue>) -> Option<FilterFn> {
        match self {
            FilterFn::Auto => Some(Self::auto_for(sample.unwrap_or(&CellValue::Empty))),
            FilterFn::Named(name) => match FilterFn::from_name(name) {
                Some(FilterFn::Auto) => {
                    Some(Self::auto_for(sample.unwrap_or(&CellValue::Empty)))
                }
                other => other,
            },
            other => Some(other.clone()),
        }
    }

    /// Returns true if `filter_value` should be treated as "not filtering"
    /// for this matcher (empty string, empty list, fully open range).
    pub fn is_auto_removed(&self, filter_value: &CellValue) -> bool {
        match self {
            FilterFn::InNumberRange => match filter_value {
                CellValue::Empty => true,
                CellValue::List(bounds) => bounds.iter().all(|b| b.is_empty()),
                _ => false,
            },
            FilterFn::ArrIncludesAll | FilterFn::ArrIncludesSome => match filter_value {
                CellValue::Empty => true,
                CellValue::List(items) => items.is_empty(),
                CellValue::Text(s) => s.is_empty(),
                _ => false,
            },
            // All remaining matchers treat empty/blank as inactive.
            _ => match filter_value {
                CellValue::Empty => true,
                CellValue::Text(s) => s.is_empty(),
                _ => false,
            },
        }
    }

    /// Evaluates the matcher. `Auto` must be resolved before this point;
    /// an unresolved `Auto` keeps every row.
    pub fn matches(&self, row_value: &CellValue, filter_value: &CellValue) -> bool {
        match self {
            // Unresolved selectors keep every row.
            FilterFn::Auto | FilterFn::Named(_) => true,
            FilterFn::IncludesString => {
                let haystack = row_value.display().to_lowercase();
                let needle = filter_value.display().to_lowercase();
                haystack.contains(&needle)
            }
            FilterFn::IncludesStringSensitive => {
                row_value.display().contains(&filter_value.display())
            }
            FilterFn::EqualsString => {
                row_value.display().to_lowercase() == filter_value.display().to_lowercase()
            }
            FilterFn::ArrIncludes => match row_value {
                CellValue::List(items) => items.contains(filter_value),
                _ => false,
            },
            FilterFn::ArrIncludesAll => match (row_value, filter_value) {
                (CellValue::List(items), CellValue::List(wanted)) => {
                    wanted.iter().all(|w| items.contains(w))
                }
                _ => false,
            },
            FilterFn::ArrIncludesSome => match (row_value, filter_value) {
                (CellValue::List(items), CellValue::List(wanted)) => {
                    wanted.iter().any(|w| items.contains(w))
                }
                _ => false,
            },
            FilterFn::Equals => row_value == filter_value,
            FilterFn::WeakEquals => row_value.display() == filter_value.display(),
            FilterFn::InNumberRange => {
                let n = match row_value.as_number() {
                    Some(n) => n,
                    None => return false,
                };
                let (min, max) = range_bounds(filter_value);
                if let Some(min) = min {
                    if n < min {
                        return false;
                    }
                }
                if let Some(max) = max {
                    if n > max {
                        return false;
                    }
                }
                true
            }
            FilterFn::Custom(f) => f(row_value, filter_value),
        }
    }
}

/// Extracts [min, max] bounds from a range filter value. The value is a
/// two-element list; `Empty` marks an open bound. A bare number is treated
/// as a closed point range.
fn range_bounds(filter_value: &CellValue) -> (Option<f64>, Option<f64>) {
    match filter_value {
        CellValue::List(bounds) => {
            let min = bounds.first().and_then(|b| b.as_number());
            let max = bounds.get(1).and_then(|b| b.as_number());
            (min, max)
        }
        CellValue::Number(n) => (Some(n.as_f64()), Some(n.as_f64())),
        _ => (None, None),
    }
}
