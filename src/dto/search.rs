//! What a search view renders at any moment.

use serde::Serialize;

use crate::cache::ErrorInfo;
use crate::domain::filter::SearchFilter;
use crate::domain::listing::Listing;
use crate::pagination::Paginated;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// The URL carried no search; nothing is fetched or shown.
    NoSearch,
    /// Waiting for the first page with nothing to show meanwhile.
    Loading,
    Ready,
    Failed,
    /// The cached page was invalidated; `retry` fetches it again.
    Invalidated,
}

/// Snapshot of a search view.
#[derive(Clone, Debug, Serialize)]
pub struct SearchView {
    pub status: ResultStatus,
    /// Listings on screen; may belong to an earlier request when `stale`.
    pub results: Option<Paginated<Listing>>,
    /// `true` while previous results are shown in place of the requested ones.
    pub stale: bool,
    /// Retryable error banner.
    pub error: Option<ErrorInfo>,
    pub filter: Option<SearchFilter>,
    pub page: usize,
}

impl SearchView {
    pub fn is_loading(&self) -> bool {
        self.status == ResultStatus::Loading
    }
}
