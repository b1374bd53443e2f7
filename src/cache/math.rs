//! Rendered-formula cache.
//!
//! Keyed by display mode plus the stripped TeX source, so the same formula
//! typeset inline and as a block occupies two entries.

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard},
};

use lru::LruCache;
use tracing::warn;

use crate::application::math::MathDisplay;

pub const DEFAULT_MATH_CACHE_CAPACITY: usize = 512;

type MathKey = (MathDisplay, String);

pub struct MathRenderCache {
    entries: Mutex<LruCache<MathKey, String>>,
}

impl MathRenderCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Lock the entries, recovering from a panic in another holder.
    fn lock_entries(&self, op: &'static str) -> MutexGuard<'_, LruCache<MathKey, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!(
                target = "cache::math",
                op,
                result = "poisoned_recovered",
                "Recovered from poisoned math cache lock"
            );
            poisoned.into_inner()
        })
    }

    pub fn get(&self, display: MathDisplay, expression: &str) -> Option<String> {
        self.lock_entries("get")
            .get(&(display, expression.to_string()))
            .cloned()
    }

    pub fn insert(&self, display: MathDisplay, expression: &str, markup: String) {
        self.lock_entries("insert")
            .put((display, expression.to_string()), markup);
    }
}

impl Default for MathRenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_MATH_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn display_mode_is_part_of_the_key() {
        let cache = MathRenderCache::new(4);
        cache.insert(MathDisplay::Inline, "x", "<i>x</i>".to_string());

        assert_eq!(cache.get(MathDisplay::Inline, "x").as_deref(), Some("<i>x</i>"));
        assert_eq!(cache.get(MathDisplay::Block, "x"), None);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let cache = MathRenderCache::new(2);
        cache.insert(MathDisplay::Inline, "a", "A".to_string());
        cache.insert(MathDisplay::Inline, "b", "B".to_string());

        // Touch `a` so `b` becomes the eviction candidate.
        assert!(cache.get(MathDisplay::Inline, "a").is_some());
        cache.insert(MathDisplay::Inline, "c", "C".to_string());

        assert!(cache.get(MathDisplay::Inline, "a").is_some());
        assert!(cache.get(MathDisplay::Inline, "b").is_none());
        assert_eq!(cache.lock_entries("test").len(), 2);
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let cache = MathRenderCache::new(0);
        cache.insert(MathDisplay::Block, "y", "Y".to_string());
        assert_eq!(cache.lock_entries("test").len(), 1);
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let cache = MathRenderCache::new(2);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.lock().expect("lock acquired");
            panic!("poison math cache");
        }));

        cache.insert(MathDisplay::Inline, "z", "Z".to_string());
        assert_eq!(cache.get(MathDisplay::Inline, "z").as_deref(), Some("Z"));
    }
}
