//! Tokio driver that connects view controllers to a [`ListingsApi`].
//!
//! Fetches run as spawned tasks; their outcomes come back over a channel and
//! are applied on the thread that owns the cache, one at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::ListingsApi;
use crate::cache::{ErrorInfo, FetchDispatcher, ResultCache};
use crate::domain::listing::ResultPage;
use crate::domain::request::{PageRequest, ResultCacheKey};
use crate::domain::types::ViewName;
use crate::repository::{SearchRecordReader, SearchRecordWriter};
use crate::services::search::{ControllerState, SearchContext, SearchController};
use crate::store::PersistedQueryStore;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Settled fetch on its way back to the cache.
#[derive(Debug)]
pub struct FetchOutcome {
    pub key: ResultCacheKey,
    pub result: Result<ResultPage, ErrorInfo>,
}

/// Spawns one task per cache miss, bounded by a deadline.
pub struct TokioDispatcher<A: ?Sized> {
    api: Arc<A>,
    timeout: Duration,
    sender: mpsc::UnboundedSender<FetchOutcome>,
}

impl<A> FetchDispatcher for TokioDispatcher<A>
where
    A: ListingsApi + ?Sized + 'static,
{
    fn dispatch(&self, key: ResultCacheKey, request: PageRequest) {
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let deadline = self.timeout;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(deadline, api.fetch_page(&request)).await {
                Ok(Ok(page)) => Ok(page),
                Ok(Err(err)) => {
                    log::warn!("Fetching {key} failed: {err}");
                    Err(ErrorInfo::from(err))
                }
                Err(_) => Err(ErrorInfo::timeout(deadline)),
            };
            if sender.send(FetchOutcome { key, result }).is_err() {
                log::debug!("Search session is gone, dropping fetch outcome");
            }
        });
    }
}

pub type SessionController<R, A> = SearchController<R, TokioDispatcher<A>>;

/// Owns the shared cache and store of one application instance.
pub struct SearchSession<R, A: ?Sized> {
    context: SearchContext<R, TokioDispatcher<A>>,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl<R, A> SearchSession<R, A>
where
    R: SearchRecordReader + SearchRecordWriter,
    A: ListingsApi + ?Sized + 'static,
{
    pub fn new(
        api: Arc<A>,
        cache: ResultCache,
        store: PersistedQueryStore<R>,
        timeout: Duration,
    ) -> Self {
        let (sender, outcomes) = mpsc::unbounded_channel();
        let dispatcher = TokioDispatcher {
            api,
            timeout,
            sender,
        };
        Self {
            context: SearchContext::new(cache, store, dispatcher),
            outcomes,
        }
    }

    pub fn context(&self) -> &SearchContext<R, TokioDispatcher<A>> {
        &self.context
    }

    /// Creates a controller for a newly opened view.
    pub fn controller(&self, view_name: ViewName, page_size: usize) -> SessionController<R, A> {
        SearchController::new(self.context.clone(), view_name, page_size)
    }

    /// Waits for the next fetch to settle and records it in the cache.
    ///
    /// Returns the settled key so the caller can notify its views.
    pub async fn resolve_next(&mut self) -> Option<ResultCacheKey> {
        let FetchOutcome { key, result } = self.outcomes.recv().await?;
        self.context.cache.borrow_mut().resolve(&key, result);
        Some(key)
    }

    /// Applies settled fetches until the controller stops waiting.
    pub async fn settle(&mut self, controller: &mut SessionController<R, A>) {
        while controller.state() == ControllerState::Fetching {
            let Some(key) = self.resolve_next().await else {
                break;
            };
            controller.on_entry_resolved(&key);
        }
    }
}
