//! Per-type resolution cache

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::resolver::{resolve, ResolvedFunction};
use crate::error::Result;
use crate::function::RuleFunction;

type CachedResolution = Arc<dyn Any + Send + Sync>;

/// Resolved operation tables keyed by rule function type
///
/// Safe to share across threads. Failed resolutions are not cached, so a
/// misconfigured type reports its error on every call.
#[derive(Default)]
pub struct ResolutionCache {
    entries: DashMap<TypeId, CachedResolution>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution of `F`, resolving on first use
    pub fn get_or_resolve<F: RuleFunction>(&self) -> Result<Arc<ResolvedFunction<F>>> {
        let key = TypeId::of::<F>();

        let cached = self.entries.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(resolved) = cached.and_then(|entry| entry.downcast::<ResolvedFunction<F>>().ok()) {
            debug!(function = F::function_name(), "resolution cache hit");
            return Ok(resolved);
        }

        debug!(function = F::function_name(), "resolution cache miss");
        let resolved = Arc::new(resolve::<F>()?);

        // Another thread may have raced us; keep whichever entry landed first.
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::clone(&resolved) as CachedResolution)
            .value()
            .clone();

        Ok(entry.downcast::<ResolvedFunction<F>>().unwrap_or(resolved))
    }

    /// Number of cached function types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached resolution
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Operation;
    use crate::reliability::ExecutionPolicy;
    use serde_json::json;

    struct Valid;

    impl RuleFunction for Valid {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::primary("run", ExecutionPolicy::default()).handler(|_, _| Ok(json!(1)))]
        }
    }

    struct Broken;

    impl RuleFunction for Broken {
        fn operations() -> Vec<Operation<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn test_reuses_resolution() {
        let cache = ResolutionCache::new();
        let first = cache.get_or_resolve::<Valid>().unwrap();
        let second = cache.get_or_resolve::<Valid>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ResolutionCache::new();
        assert!(cache.get_or_resolve::<Broken>().is_err());
        assert!(cache.get_or_resolve::<Broken>().is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResolutionCache::new();
        let first = cache.get_or_resolve::<Valid>().unwrap();
        cache.clear();
        assert!(cache.is_empty());

        let second = cache.get_or_resolve::<Valid>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
