//! FILENAME: row-model/src/sorting_fns.rs
//! Sorting function registry - named comparators plus "auto" probing.
//!
//! A sort criterion resolves to one of these comparators. `Auto` probes a
//! sample of row values: text with embedded digits gets the natural
//! (alphanumeric) compare, plain text the case-insensitive compare, dates
//! the datetime compare, everything else the basic value compare.

use std::cmp::Ordering;
use std::sync::Arc;
use table_engine::CellValue;

/// Signature of a caller-supplied comparator over row values.
pub type CustomSortingFn = Arc<dyn Fn(&CellValue, &CellValue) -> Ordering + Send + Sync>;

/// A column sort comparator.
#[derive(Clone)]
pub enum SortingFn {
    /// Probe sample values and choose a concrete comparator.
    Auto,
    /// Natural compare: digit runs compare numerically, case-insensitive.
    Alphanumeric,
    /// Natural compare, case-sensitive.
    AlphanumericCaseSensitive,
    /// Case-insensitive text compare.
    Text,
    /// Case-sensitive text compare.
    TextCaseSensitive,
    /// Compare by date (epoch milliseconds).
    Datetime,
    /// The fallback total order over cell values.
    Basic,
    /// Deferred registry lookup by name. Unknown names drop the sort
    /// criterion with a diagnostic.
    Named(String),
    /// Caller-supplied comparator.
    Custom(CustomSortingFn),
}

impl std::fmt::Debug for SortingFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for SortingFn {
    fn default() -> Self {
        SortingFn::Auto
    }
}

impl SortingFn {
    /// Looks up a comparator by registry name.
    pub fn from_name(name: &str) -> Option<SortingFn> {
        match name {
            "auto" => Some(SortingFn::Auto),
            "alphanumeric" => Some(SortingFn::Alphanumeric),
            "alphanumericCaseSensitive" => Some(SortingFn::AlphanumericCaseSensitive),
            "text" => Some(SortingFn::Text),
            "textCaseSensitive" => Some(SortingFn::TextCaseSensitive),
            "datetime" => Some(SortingFn::Datetime),
            "basic" => Some(SortingFn::Basic),
            _ => None,
        }
    }

    /// Registry name, for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            SortingFn::Auto => "auto",
            SortingFn::Alphanumeric => "alphanumeric",
            SortingFn::AlphanumericCaseSensitive => "alphanumericCaseSensitive",
            SortingFn::Text => "text",
            SortingFn::TextCaseSensitive => "textCaseSensitive",
            SortingFn::Datetime => "datetime",
            SortingFn::Basic => "basic",
            SortingFn::Named(name) => name,
            SortingFn::Custom(_) => "custom",
        }
    }

    /// Resolves `Auto` by probing samples and `Named` against the registry.
    /// Returns None when a name is unknown; the caller drops the criterion
    /// with a diagnostic.
    pub fn resolve<'a>(
        &self,
        samples: impl Iterator<Item = &'a CellValue>,
    ) -> Option<SortingFn> {
        match self {
            SortingFn::Auto => Some(Self::auto_for(samples)),
            SortingFn::Named(name) => match SortingFn::from_name(name) {
                Some(SortingFn::Auto) => Some(Self::auto_for(samples)),
                other => other,
            },
            other => Some(other.clone()),
        }
    }

    /// Chooses a concrete comparator for `Auto` by probing sample values.
    pub fn auto_for<'a>(samples: impl Iterator<Item = &'a CellValue>) -> SortingFn {
        let mut saw_text = false;
        for value in samples {
            match value {
                CellValue::Date(_) => return SortingFn::Datetime,
                CellValue::Text(s) => {
                    if s.chars().any(|c| c.is_ascii_digit()) {
                        return SortingFn::Alphanumeric;
                    }
                    saw_text = true;
                }
                CellValue::Empty => continue,
                _ => return SortingFn::Basic,
            }
        }
        if saw_text {
            SortingFn::Text
        } else {
            SortingFn::Basic
        }
    }

    /// Compares two row values. `Auto` must be resolved before this point;
    /// an unresolved `Auto` falls back to the basic compare.
    pub fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        match self {
            SortingFn::Auto | SortingFn::Named(_) | SortingFn::Basic => a.compare(b),
            SortingFn::Alphanumeric => {
                alphanumeric_compare(&a.display().to_lowercase(), &b.display().to_lowercase())
            }
            SortingFn::AlphanumericCaseSensitive => {
                alphanumeric_compare(&a.display(), &b.display())
            }
            SortingFn::Text => a
                .display()
                .to_lowercase()
                .cmp(&b.display().to_lowercase()),
            SortingFn::TextCaseSensitive => a.display().cmp(&b.display()),
            SortingFn::Datetime => {
                let da = date_millis(a);
                let db = date_millis(b);
                da.cmp(&db)
            }
            SortingFn::Custom(f) => f(a, b),
        }
    }
}

fn date_millis(value: &CellValue) -> i64 {
    match value {
        CellValue::Date(ms) => *ms,
        CellValue::Number(n) => n.as_f64() as i64,
        _ => i64::MIN,
    }
}

/// Natural string compare: runs of digits compare as numbers, everything
/// else compares character-wise. "item2" sorts before "item10".
fn alphanumeric_compare(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let na = take_number(&mut ca);
                    let nb = take_number(&mut cb);
                    match na.cmp(&nb) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                match x.cmp(&y) {
                    Ordering::Equal => {
                        ca.next();
                        cb.next();
                    }
                    ord => return ord,
                }
            }
        }
    }
}

/// Consumes a run of ASCII digits and returns its numeric value.
/// Leading zeros are insignificant (compared as numbers).
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> u128 {
    let mut n: u128 = 0;
    while let Some(c) = chars.peek().copied() {
        if let Some(d) = c.to_digit(10) {
            n = n.saturating_mul(10).saturating_add(d as u128);
            chars.next();
        } else {
            break;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumeric_natural_order() {
        let f = SortingFn::Alphanumeric;
        assert_eq!(
            f.compare(&CellValue::text("item2"), &CellValue::text("item10")),
            Ordering::Less
        );
        assert_eq!(
            f.compare(&CellValue::text("Item2"), &CellValue::text("item2")),
            Ordering::Equal
        );
        assert_eq!(
            f.compare(&CellValue::text("a100"), &CellValue::text("a99")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_alphanumeric_case_sensitive() {
        let f = SortingFn::AlphanumericCaseSensitive;
        assert_ne!(
            f.compare(&CellValue::text("Item2"), &CellValue::text("item2")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_text_compare() {
        let f = SortingFn::Text;
        assert_eq!(
            f.compare(&CellValue::text("Apple"), &CellValue::text("banana")),
            Ordering::Less
        );
    }

    #[test]
    fn test_datetime_compare() {
        let f = SortingFn::Datetime;
        assert_eq!(
            f.compare(&CellValue::Date(1_000), &CellValue::Date(2_000)),
            Ordering::Less
        );
    }

    #[test]
    fn test_basic_compare_numbers() {
        let f = SortingFn::Basic;
        assert_eq!(
            f.compare(&CellValue::number(1.0), &CellValue::number(2.0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_auto_probing() {
        let digits = [CellValue::text("abc123")];
        assert!(matches!(
            SortingFn::auto_for(digits.iter()),
            SortingFn::Alphanumeric
        ));

        let plain = [CellValue::text("abc")];
        assert!(matches!(SortingFn::auto_for(plain.iter()), SortingFn::Text));

        let dates = [CellValue::Date(0)];
        assert!(matches!(
            SortingFn::auto_for(dates.iter()),
            SortingFn::Datetime
        ));

        let numbers = [CellValue::number(1.0)];
        assert!(matches!(
            SortingFn::auto_for(numbers.iter()),
            SortingFn::Basic
        ));
    }

    #[test]
    fn test_registry_lookup() {
        assert!(SortingFn::from_name("alphanumeric").is_some());
        assert!(SortingFn::from_name("datetime").is_some());
        assert!(SortingFn::from_name("bogus").is_none());
    }

    #[test]
    fn test_named_resolution() {
        let named = SortingFn::Named("text".to_string());
        assert!(matches!(
            named.resolve(std::iter::empty()),
            Some(SortingFn::Text)
        ));
        let unknown = SortingFn::Named("bogus".to_string());
        assert!(unknown.resolve(std::iter::empty()).is_none());
    }
}
