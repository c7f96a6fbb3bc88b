//! Reconciliation of a search view's URL, draft form and cached results.
//!
//! Each mounted search view owns one [`SearchController`]. The URL is
//! authoritative on mount and on external navigation; explicit submissions
//! are authoritative afterwards. Results for keys the view no longer wants
//! are never applied.

use std::rc::Rc;

use serde::Serialize;

use crate::cache::{
    ErrorInfo, FetchDispatcher, ResultCache, ResultCacheEntry, SharedResultCache, ViewId,
};
use crate::domain::filter::SearchFilter;
use crate::domain::listing::{Listing, ResultPage};
use crate::domain::request::{PageRequest, ResultCacheKey};
use crate::domain::types::{SortOrder, ViewName};
use crate::dto::search::{ResultStatus, SearchView};
use crate::forms::search::SearchForm;
use crate::pagination::Paginated;
use crate::query;
use crate::repository::{SearchRecordReader, SearchRecordWriter};
use crate::services::{ServiceError, ServiceResult};
use crate::store::{PersistedQueryStore, SharedQueryStore};

/// Shared resources injected into every view controller.
pub struct SearchContext<R, D: ?Sized> {
    pub cache: SharedResultCache,
    pub store: SharedQueryStore<R>,
    pub dispatcher: Rc<D>,
}

impl<R, D: ?Sized> Clone for SearchContext<R, D> {
    fn clone(&self) -> Self {
        Self {
            cache: Rc::clone(&self.cache),
            store: Rc::clone(&self.store),
            dispatcher: Rc::clone(&self.dispatcher),
        }
    }
}

impl<R, D> SearchContext<R, D> {
    pub fn new(cache: ResultCache, store: PersistedQueryStore<R>, dispatcher: D) -> Self {
        Self {
            cache: cache.shared(),
            store: store.shared(),
            dispatcher: Rc::new(dispatcher),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Uninitialized,
    Hydrating,
    Idle,
    Fetching,
    TornDown,
}

/// The canonical filter and page currently driving the view.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedSearch {
    pub filter: SearchFilter,
    pub page: usize,
}

/// Outcome of a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    /// Query string to push to the address bar, if it changed.
    pub url: Option<String>,
    /// Key the view is now waiting for or showing.
    pub key: Option<ResultCacheKey>,
    pub state: ControllerState,
}

pub struct SearchController<R, D: ?Sized> {
    context: SearchContext<R, D>,
    view: ViewId,
    view_name: ViewName,
    page_size: usize,
    state: ControllerState,
    draft: SearchForm,
    applied: Option<AppliedSearch>,
    desired: Option<ResultCacheKey>,
}

impl<R, D> SearchController<R, D>
where
    R: SearchRecordReader + SearchRecordWriter,
    D: FetchDispatcher + ?Sized,
{
    pub fn new(context: SearchContext<R, D>, view_name: ViewName, page_size: usize) -> Self {
        let view = context.cache.borrow_mut().register_view();
        Self {
            context,
            view,
            view_name,
            page_size: page_size.max(1),
            state: ControllerState::Uninitialized,
            draft: SearchForm::default(),
            applied: None,
            desired: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn view_id(&self) -> ViewId {
        self.view
    }

    pub fn applied(&self) -> Option<&AppliedSearch> {
        self.applied.as_ref()
    }

    pub fn desired_key(&self) -> Option<&ResultCacheKey> {
        self.desired.as_ref()
    }

    pub fn draft(&self) -> &SearchForm {
        &self.draft
    }

    /// Edits only the draft: no fetch, no URL change until submission.
    pub fn draft_mut(&mut self) -> &mut SearchForm {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: SearchForm) {
        self.draft = draft;
    }

    /// Hydrates the view from the URL it was opened with.
    pub fn mount(&mut self, query: &str) -> ServiceResult<Reconciliation> {
        match self.state {
            ControllerState::Uninitialized => Ok(self.hydrate(query)),
            ControllerState::TornDown => Err(ServiceError::TornDown),
            _ => Err(ServiceError::AlreadyMounted),
        }
    }

    /// Applies the draft as a new search starting at page 1.
    pub fn submit(&mut self) -> ServiceResult<Reconciliation> {
        self.ensure_mounted()?;
        let filter = SearchFilter::try_from(&self.draft).map_err(|err| {
            log::info!("{}: search rejected, fields {:?}: {err}", self.view, err.fields());
            err
        })?;
        let outcome = self.submit_filter(filter.clone())?;
        self.draft = SearchForm::from(&filter);
        Ok(outcome)
    }

    /// Sort changes apply immediately without touching other draft edits.
    /// Picking the sort already applied changes nothing.
    pub fn change_sort(&mut self, sort: SortOrder) -> ServiceResult<Reconciliation> {
        self.ensure_mounted()?;
        self.draft.sort = sort;
        let filter = match &self.applied {
            Some(applied) if applied.filter.sort() == sort => return Ok(self.unchanged()),
            Some(applied) => applied.filter.with_sort(sort),
            None => SearchFilter::try_from(&self.draft)?,
        };
        self.submit_filter(filter)
    }

    /// Shows another page of the applied search. Not a new search: the
    /// persisted record is left alone.
    pub fn go_to_page(&mut self, page: usize) -> ServiceResult<Reconciliation> {
        self.ensure_mounted()?;
        let applied = self.applied.clone().ok_or(ServiceError::NoActiveSearch)?;
        let page = self.clamp_page(page);
        if page == applied.page {
            return Ok(self.unchanged());
        }

        let url = location_for(&applied.filter, page)?;
        let mut outcome = self.apply(applied.filter, page);
        outcome.url = Some(url);
        Ok(outcome)
    }

    pub fn next_page(&mut self) -> ServiceResult<Reconciliation> {
        let page = self.applied.as_ref().map_or(1, |applied| applied.page + 1);
        self.go_to_page(page)
    }

    pub fn previous_page(&mut self) -> ServiceResult<Reconciliation> {
        let page = self
            .applied
            .as_ref()
            .map_or(1, |applied| applied.page.saturating_sub(1));
        self.go_to_page(page)
    }

    /// Handles navigation the view did not initiate (back/forward, edited
    /// address bar). The URL wins and any unsaved draft is discarded, unless
    /// it describes exactly the search already applied.
    pub fn on_url_changed(&mut self, query: &str) -> ServiceResult<Reconciliation> {
        self.ensure_mounted()?;
        let params = query::parse_query_string(query);
        if query::has_search_params(&params) {
            let incoming = AppliedSearch {
                filter: query::decode(&params),
                page: query::decode_page(&params),
            };
            if self.applied.as_ref() == Some(&incoming) {
                return Ok(self.unchanged());
            }
        }
        log::debug!("{}: re-hydrating from URL {query:?}", self.view);
        Ok(self.hydrate(query))
    }

    /// Reacts to a settled cache entry. Returns `true` when the view changed.
    pub fn on_entry_resolved(&mut self, key: &ResultCacheKey) -> bool {
        if self.state == ControllerState::TornDown {
            return false;
        }
        if self.desired.as_ref() != Some(key) {
            log::debug!("{}: discarding result for abandoned key {key}", self.view);
            return false;
        }
        let settled = self
            .context
            .cache
            .borrow()
            .entry(key)
            .is_some_and(|entry| !entry.is_pending());
        if settled {
            self.state = ControllerState::Idle;
        }
        settled
    }

    /// Records a fetch outcome in the shared cache and applies it to this
    /// view if it is still wanted.
    pub fn resolve(
        &mut self,
        key: &ResultCacheKey,
        outcome: Result<ResultPage, ErrorInfo>,
    ) -> bool {
        self.context.cache.borrow_mut().resolve(key, outcome);
        self.on_entry_resolved(key)
    }

    /// Requests the applied search again. A failed or invalidated entry is
    /// refetched.
    pub fn retry(&mut self) -> ServiceResult<Reconciliation> {
        self.ensure_mounted()?;
        if self.applied.is_none() {
            return Err(ServiceError::NoActiveSearch);
        }
        Ok(self.request())
    }

    /// Snapshot of what the view should render.
    pub fn view(&self) -> SearchView {
        let Some(applied) = &self.applied else {
            return SearchView {
                status: ResultStatus::NoSearch,
                results: None,
                stale: false,
                error: None,
                filter: None,
                page: 1,
            };
        };

        let cache = self.context.cache.borrow();
        let current = self.desired.as_ref().and_then(|key| cache.entry(key));
        let previous = cache.last_ready_entry(self.view);

        let (status, shown, error) = match current {
            Some(entry) if entry.is_ready() => (ResultStatus::Ready, Some(entry), None),
            Some(entry) if entry.error.is_some() => {
                (ResultStatus::Failed, previous, entry.error.clone())
            }
            Some(_) => (ResultStatus::Loading, previous, None),
            None => (ResultStatus::Invalidated, previous, None),
        };
        let stale = shown.is_some() && status != ResultStatus::Ready;

        SearchView {
            status,
            results: shown.and_then(paginate),
            stale,
            error,
            filter: Some(applied.filter.clone()),
            page: applied.page,
        }
    }

    /// Terminal transition; the view's cache references are released.
    pub fn teardown(&mut self) {
        if self.state == ControllerState::TornDown {
            return;
        }
        self.context.cache.borrow_mut().release_view(self.view);
        self.state = ControllerState::TornDown;
        self.desired = None;
    }

    fn ensure_mounted(&self) -> ServiceResult<()> {
        match self.state {
            ControllerState::Uninitialized => Err(ServiceError::NotMounted),
            ControllerState::TornDown => Err(ServiceError::TornDown),
            _ => Ok(()),
        }
    }

    fn hydrate(&mut self, query: &str) -> Reconciliation {
        self.state = ControllerState::Hydrating;
        let params = query::parse_query_string(query);

        if !query::has_search_params(&params) {
            self.applied = None;
            self.desired = None;
            self.draft = self.prefill();
            self.state = ControllerState::Idle;
            return self.unchanged();
        }

        let filter = query::decode(&params);
        let page = query::decode_page(&params);
        self.draft = SearchForm::from(&filter);
        self.apply(filter, page)
    }

    /// Remembered search, used to pre-fill the form of a view without one.
    fn prefill(&self) -> SearchForm {
        self.context
            .store
            .borrow()
            .get()
            .map(|record| SearchForm::from(&record.filter))
            .unwrap_or_default()
    }

    fn submit_filter(&mut self, filter: SearchFilter) -> ServiceResult<Reconciliation> {
        let url = location_for(&filter, 1)?;
        log::info!("{}: applying search {url:?}", self.view);
        self.context
            .store
            .borrow_mut()
            .set(filter.clone(), self.view_name.clone());
        let mut outcome = self.apply(filter, 1);
        outcome.url = Some(url);
        Ok(outcome)
    }

    fn apply(&mut self, filter: SearchFilter, page: usize) -> Reconciliation {
        self.applied = Some(AppliedSearch { filter, page });
        self.request()
    }

    fn request(&mut self) -> Reconciliation {
        let Some(applied) = &self.applied else {
            return self.unchanged();
        };
        let request = PageRequest::new(applied.filter.clone(), applied.page, self.page_size);
        let entry = self.context.cache.borrow_mut().get_or_fetch(
            self.view,
            &request,
            self.context.dispatcher.as_ref(),
        );

        self.state = if entry.is_pending() {
            ControllerState::Fetching
        } else {
            ControllerState::Idle
        };
        self.desired = Some(entry.key.clone());

        Reconciliation {
            url: None,
            key: Some(entry.key),
            state: self.state,
        }
    }

    fn unchanged(&self) -> Reconciliation {
        Reconciliation {
            url: None,
            key: self.desired.clone(),
            state: self.state,
        }
    }

    /// Keeps the page within the range known from the current results. An
    /// empty result still has page 1.
    fn clamp_page(&self, page: usize) -> usize {
        let page = page.max(1);
        let cache = self.context.cache.borrow();
        let known_pages = self
            .desired
            .as_ref()
            .and_then(|key| cache.entry(key))
            .and_then(|entry| entry.data.as_ref().map(|data| data.total_pages(entry.page_size)));
        match known_pages {
            Some(total_pages) => page.min(total_pages.max(1)),
            None => page,
        }
    }
}

impl<R, D: ?Sized> Drop for SearchController<R, D> {
    fn drop(&mut self) {
        if self.state == ControllerState::TornDown {
            return;
        }
        if let Ok(mut cache) = self.context.cache.try_borrow_mut() {
            cache.release_view(self.view);
        }
    }
}

fn location_for(filter: &SearchFilter, page: usize) -> ServiceResult<String> {
    Ok(query::to_query_string(&query::encode_page(filter, page))?)
}

fn paginate(entry: &ResultCacheEntry) -> Option<Paginated<Listing>> {
    let data = entry.data.as_ref()?;
    Some(Paginated::new(
        data.items.clone(),
        entry.page,
        data.total,
        entry.page_size,
    ))
}
