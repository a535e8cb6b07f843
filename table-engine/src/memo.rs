//! FILENAME: table-engine/src/memo.rs
//! One-slot memoization - dependency-keyed recomputation for pipeline stages.
//!
//! Each pipeline stage owns exactly one `Memo` slot. A call supplies the
//! current dependency tuple; if it differs from the stored one (field-wise
//! `PartialEq`), the compute closure reruns and the result is cached.
//! There is no eviction beyond the single slot and no failure mode.

/// A single-slot cache keyed by a dependency value.
#[derive(Debug, Clone, Default)]
pub struct Memo<D, R> {
    slot: Option<(D, R)>,
}

impl<D: PartialEq, R: Clone> Memo<D, R> {
    pub fn new() -> Self {
        Memo { slot: None }
    }

    /// Returns the cached result if `deps` matches the stored dependencies,
    /// otherwise recomputes, stores, and returns the fresh result.
    pub fn get(&mut self, deps: D, compute: impl FnOnce(&D) -> R) -> R {
        if let Some((stored, result)) = &self.slot {
            if *stored == deps {
                return result.clone();
            }
        }
        let result = compute(&deps);
        self.slot = Some((deps, result.clone()));
        result
    }

    /// Like `get`, but invokes `on_change` whenever a recompute happens.
    /// Used for instrumentation (stage timing, debug logging).
    pub fn get_with(
        &mut self,
        deps: D,
        compute: impl FnOnce(&D) -> R,
        on_change: impl FnOnce(),
    ) -> R {
        if let Some((stored, result)) = &self.slot {
            if *stored == deps {
                return result.clone();
            }
        }
        on_change();
        let result = compute(&deps);
        self.slot = Some((deps, result.clone()));
        result
    }

    /// Drops the cached slot, forcing the next `get` to recompute.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// Returns true if a result is currently cached.
    pub fn is_cached(&self) -> bool {
        self.slot.is_some()
    }
}
