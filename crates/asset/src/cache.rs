//! Model cache keyed by source and rendering context.
//!
//! Compiled draw resources are only valid for the context that built them, so
//! the same source loaded for two contexts is two entries.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::RwLock;

use crate::{error::AssetResult, model::Model};

/// Identity of the rendering context a model is prepared for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub source: String,
    pub context: ContextId,
}

impl ModelKey {
    pub fn new(source: impl Into<String>, context: ContextId) -> Self {
        Self {
            source: source.into(),
            context,
        }
    }
}

/// Loaded models shared as `Arc<Model>`.
///
/// Loads run outside the lock. When two threads race on the same key the
/// first insert wins and the other thread drops its own model and returns the
/// stored one. Failed loads are never stored.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: RwLock<HashMap<ModelKey, Arc<Model>>>,
    loads: AtomicUsize,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ModelKey) -> Option<Arc<Model>> {
        self.models.read().get(key).cloned()
    }

    /// Return the cached model for `key`, running `load` on a miss.
    pub fn get_or_load_with<F>(&self, key: ModelKey, load: F) -> AssetResult<Arc<Model>>
    where
        F: FnOnce() -> AssetResult<Model>,
    {
        if let Some(model) = self.get(&key) {
            return Ok(model);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let model = Arc::new(load()?);

        let mut models = self.models.write();
        match models.entry(key) {
            Entry::Occupied(entry) => {
                log::debug!(
                    "{} (context {}) was loaded concurrently, keeping the stored model",
                    entry.key().source,
                    entry.key().context.0
                );
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => Ok(Arc::clone(entry.insert(model))),
        }
    }

    pub fn remove(&self, key: &ModelKey) -> Option<Arc<Model>> {
        self.models.write().remove(key)
    }

    /// Drop every model, e.g. to force a reload from disk.
    pub fn clear(&self) {
        let mut models = self.models.write();
        log::info!("Clearing {} cached models", models.len());
        models.clear();
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// How many times a load has run (including failed ones).
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::*;
    use crate::{
        config::LoadOptions,
        error::AssetError,
        loader::load_model,
        resource::ResourceLocator,
    };

    fn locator() -> ResourceLocator {
        ResourceLocator::new().with_bundled("m/tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
    }

    #[test]
    fn second_request_reuses_stored_model() {
        let locator = locator();
        let cache = ModelCache::new();
        let key = ModelKey::new("m/tri.obj", ContextId(1));
        let load = || load_model(&locator, "m/tri.obj", &LoadOptions::default());

        let a = cache.get_or_load_with(key.clone(), load).expect("first");
        let b = cache.get_or_load_with(key, load).expect("second");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.loads(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn contexts_are_separate_entries() {
        let locator = locator();
        let cache = ModelCache::new();
        let load = || load_model(&locator, "m/tri.obj", &LoadOptions::default());

        let a = cache
            .get_or_load_with(ModelKey::new("m/tri.obj", ContextId(1)), load)
            .expect("ctx 1");
        let b = cache
            .get_or_load_with(ModelKey::new("m/tri.obj", ContextId(2)), load)
            .expect("ctx 2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ModelCache::new();
        let key = ModelKey::new("x.obj", ContextId(0));
        let fail = || Err(AssetError::format("x.obj", 1, "broken"));

        assert!(cache.get_or_load_with(key.clone(), fail).is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_load_with(key, fail).is_err());
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn remove_and_clear_force_reload() {
        let locator = locator();
        let cache = ModelCache::new();
        let key = ModelKey::new("m/tri.obj", ContextId(0));
        let load = || load_model(&locator, "m/tri.obj", &LoadOptions::default());

        let first = cache.get_or_load_with(key.clone(), load).expect("load");
        assert!(cache.remove(&key).is_some());
        let second = cache.get_or_load_with(key.clone(), load).expect("reload");
        assert!(!Arc::ptr_eq(&first, &second));

        cache.clear();
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn concurrent_first_requests_share_one_model() {
        let locator = locator();
        let cache = ModelCache::new();
        let barrier = Barrier::new(4);

        let models: Vec<Arc<Model>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_load_with(ModelKey::new("m/tri.obj", ContextId(7)), || {
                                load_model(&locator, "m/tri.obj", &LoadOptions::default())
                            })
                            .expect("load")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("join")).collect()
        });

        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
