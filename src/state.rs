use crate::api::{ApiClient, ApiError};
use crate::cache::FetchCache;
use crate::config::Config;
use crate::models::{Grant, GrantSummary};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub grants: FetchCache<Vec<GrantSummary>>,
    pub grant_details: FetchCache<Grant>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(&config.api_url, config.request_timeout)?,
            grants: FetchCache::new(config.cache_ttl, config.render_wait),
            grant_details: FetchCache::new(config.cache_ttl, config.render_wait),
        })
    }
}
