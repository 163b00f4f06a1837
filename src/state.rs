//! Shared application state for all routes. Built once at startup and never mutated.

use crate::cache::ResponseCache;
use crate::config::ApiConfig;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<ApiConfig>,
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ApiConfig) -> Self {
        let cache = ResponseCache::new(config.default_caching, config.cache_max_entries);
        AppState {
            store,
            config: Arc::new(config),
            cache: Arc::new(cache),
        }
    }
}
