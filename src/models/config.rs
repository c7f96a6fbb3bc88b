//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CachePolicy, DEFAULT_MAX_AGE, DEFAULT_MAX_ENTRIES};
use crate::pagination::DEFAULT_PAGE_SIZE;

#[derive(Clone, Debug, Deserialize)]
/// Settings of one search client instance.
pub struct AppConfig {
    pub api_base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// File holding the last submitted search.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_view_name")]
    pub view_name: String,
}

impl AppConfig {
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            max_entries: self.cache_max_entries,
            max_age: Duration::from_secs(self.cache_max_age_secs),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_storage_path() -> String {
    "last_search.json".to_string()
}

fn default_cache_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_cache_max_age_secs() -> u64 {
    DEFAULT_MAX_AGE.as_secs()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_view_name() -> String {
    "search".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base_url": "http://localhost:8080"}"#).unwrap();

        assert_eq!(config.page_size, 18);
        assert_eq!(config.view_name, "search");
        assert_eq!(config.cache_policy().max_entries, 64);
        assert_eq!(config.cache_policy().max_age, Duration::from_secs(300));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
    }
}
