//! Page requests and the cache keys derived from them.

use std::fmt::{Display, Formatter};

use crate::domain::filter::SearchFilter;
use crate::query;

/// A filter paired with the page the view wants to show.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub filter: SearchFilter,
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Creates a request; page and page size are normalized to at least 1.
    pub fn new(filter: SearchFilter, page: usize, page_size: usize) -> Self {
        Self {
            filter,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Deterministic key identifying this request in the result cache.
    pub fn cache_key(&self) -> ResultCacheKey {
        ResultCacheKey::from(self)
    }
}

/// Stable serialization of a [`PageRequest`].
///
/// Built from the encoded filter, so parameters appear in sorted key order and
/// empty values are omitted: equal requests always yield equal keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultCacheKey(String);

impl ResultCacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&PageRequest> for ResultCacheKey {
    fn from(request: &PageRequest) -> Self {
        let params = query::encode(&request.filter);
        let filter = params
            .iter()
            .map(|(key, value)| format!("{key}={}", escape(value)))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!(
            "{filter}|page={}|page_size={}",
            request.page, request.page_size
        ))
    }
}

impl Display for ResultCacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes the separators used by the key layout.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3D"),
            '|' => escaped.push_str("%7C"),
            other => escaped.push(other),
        }
    }
    escaped
}
