//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CachedMileageResolver, MileageCacheConfig};
use crate::chain::ChainRunner;
use crate::dispatch::{Coordinator, CoordinatorConfig};
use crate::mileage::MileageResolver;
use crate::store::MemoryStore;

/// Shared application state.
///
/// Every service reads and writes the same store.
#[derive(Clone)]
pub struct AppState {
    /// Trip lifecycle transitions
    pub coordinator: Arc<Coordinator<MemoryStore>>,

    /// Cached mileage lookups
    pub mileage: Arc<CachedMileageResolver<MemoryStore>>,

    /// Legacy route batch jobs
    pub chains: Arc<ChainRunner<MemoryStore>>,
}

impl AppState {
    /// Create a new app state over `store`.
    pub fn new(
        store: Arc<MemoryStore>,
        config: CoordinatorConfig,
        cache: &MileageCacheConfig,
    ) -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new(store.clone(), config)),
            mileage: Arc::new(CachedMileageResolver::new(
                MileageResolver::new(store.clone()),
                cache,
            )),
            chains: Arc::new(ChainRunner::new(store)),
        }
    }
}
