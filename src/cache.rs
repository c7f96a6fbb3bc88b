//! Key-based cache of result pages shared by all search views.
//!
//! Entries move from `Pending` to `Ready` or `Failed` exactly once. Pending
//! entries are never dropped: invalidation, expiry and eviction only touch
//! settled entries. Each registered view remembers the key it currently wants
//! and the last entry it saw ready, which lets it keep showing the previous page
//! while the next one loads. The last ready entry is kept by value, so a
//! refetch of the same key by another view never blanks what is on screen.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::domain::listing::ResultPage;
use crate::domain::request::{PageRequest, ResultCacheKey};

/// Handle shared by every view controller of the application.
pub type SharedResultCache = Rc<RefCell<ResultCache>>;

pub const DEFAULT_MAX_ENTRIES: usize = 64;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Identifies one mounted view instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Ready,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    Server,
    InvalidPayload,
}

/// User-displayable description of a failed fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("Сервер не ответил за {} с. Попробуйте ещё раз.", after.as_secs()),
        )
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultCacheEntry {
    pub key: ResultCacheKey,
    pub page: usize,
    pub page_size: usize,
    pub status: EntryStatus,
    pub data: Option<Arc<ResultPage>>,
    pub error: Option<ErrorInfo>,
    pub fetched_at: DateTime<Utc>,
}

impl ResultCacheEntry {
    fn pending(key: ResultCacheKey, request: &PageRequest, now: DateTime<Utc>) -> Self {
        Self {
            key,
            page: request.page,
            page_size: request.page_size,
            status: EntryStatus::Pending,
            data: None,
            error: None,
            fetched_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    pub fn is_ready(&self) -> bool {
        self.status == EntryStatus::Ready
    }
}

/// Starts the network request for a cache miss.
///
/// Implementations must not block; the outcome is delivered later through
/// [`ResultCache::resolve`].
pub trait FetchDispatcher {
    fn dispatch(&self, key: ResultCacheKey, request: PageRequest);
}

impl<F> FetchDispatcher for F
where
    F: Fn(ResultCacheKey, PageRequest),
{
    fn dispatch(&self, key: ResultCacheKey, request: PageRequest) {
        self(key, request)
    }
}

/// Bounds on cache growth.
#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    /// Settled entries beyond this count are evicted, oldest first.
    pub max_entries: usize,
    /// Settled entries older than this are refetched on next access.
    pub max_age: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

#[derive(Debug, Default)]
struct ViewSlot {
    current: Option<ResultCacheKey>,
    last_ready: Option<ResultCacheEntry>,
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<ResultCacheKey, ResultCacheEntry>,
    views: HashMap<ViewId, ViewSlot>,
    next_view: u64,
    policy: CachePolicy,
}

impl ResultCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedResultCache {
        Rc::new(RefCell::new(self))
    }

    pub fn register_view(&mut self) -> ViewId {
        self.next_view += 1;
        let view = ViewId(self.next_view);
        self.views.insert(view, ViewSlot::default());
        view
    }

    /// Forgets a torn-down view; its entries become evictable.
    pub fn release_view(&mut self, view: ViewId) {
        self.views.remove(&view);
    }

    /// Returns the entry for the request, dispatching a fetch only when no
    /// ready or pending entry exists for its key.
    pub fn get_or_fetch<D>(
        &mut self,
        view: ViewId,
        request: &PageRequest,
        dispatcher: &D,
    ) -> ResultCacheEntry
    where
        D: FetchDispatcher + ?Sized,
    {
        let now = Utc::now();
        self.expire(now);

        let key = request.cache_key();
        let cutoff = self.cutoff(now);
        let reusable = self.entries.get(&key).and_then(|entry| match entry.status {
            EntryStatus::Pending => Some(entry.clone()),
            EntryStatus::Ready if cutoff.is_none_or(|cutoff| entry.fetched_at >= cutoff) => {
                Some(entry.clone())
            }
            _ => None,
        });

        let slot = self.views.entry(view).or_default();
        slot.current = Some(key.clone());

        if let Some(entry) = reusable {
            if entry.is_ready() {
                slot.last_ready = Some(entry.clone());
            }
            log::debug!("{view}: reusing {:?} entry for {key}", entry.status);
            return entry;
        }

        let entry = ResultCacheEntry::pending(key.clone(), request, now);
        self.entries.insert(key.clone(), entry.clone());
        log::debug!("{view}: fetching {key}");
        dispatcher.dispatch(key, request.clone());
        self.evict();
        entry
    }

    /// Applies a fetch outcome to its pending entry.
    ///
    /// Returns `None` when no pending entry exists for the key, e.g. for a
    /// duplicate completion.
    pub fn resolve(
        &mut self,
        key: &ResultCacheKey,
        outcome: Result<ResultPage, ErrorInfo>,
    ) -> Option<ResultCacheEntry> {
        let Some(entry) = self.entries.get_mut(key) else {
            log::debug!("Ignoring completion for unknown key {key}");
            return None;
        };
        if !entry.is_pending() {
            log::debug!("Ignoring completion for settled key {key}");
            return None;
        }

        match outcome {
            Ok(page) => {
                entry.status = EntryStatus::Ready;
                entry.data = Some(Arc::new(page));
                entry.error = None;
            }
            Err(error) => {
                log::warn!("Fetch for {key} failed: {error}");
                entry.status = EntryStatus::Failed;
                entry.data = None;
                entry.error = Some(error);
            }
        }
        entry.fetched_at = Utc::now();
        let resolved = entry.clone();

        if resolved.is_ready() {
            for slot in self.views.values_mut() {
                if slot.current.as_ref() == Some(key) {
                    slot.last_ready = Some(resolved.clone());
                }
            }
        }
        Some(resolved)
    }

    /// Removes settled entries matching the predicate and returns how many
    /// were removed. Pending entries are always kept.
    pub fn invalidate<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&ResultCacheEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.is_pending() || !predicate(entry));
        before - self.entries.len()
    }

    pub fn entry(&self, key: &ResultCacheKey) -> Option<&ResultCacheEntry> {
        self.entries.get(key)
    }

    /// Entry for the key the view asked for most recently.
    pub fn current_entry(&self, view: ViewId) -> Option<&ResultCacheEntry> {
        let key = self.views.get(&view)?.current.as_ref()?;
        self.entries.get(key)
    }

    /// Most recent ready entry the view asked for, as it was when it settled.
    /// It outlives eviction, invalidation and refetches of its key.
    pub fn last_ready_entry(&self, view: ViewId) -> Option<&ResultCacheEntry> {
        self.views.get(&view)?.last_ready.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops expired settled entries no view refers to.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = self.cutoff(now) else {
            return;
        };
        let views = &self.views;
        self.entries.retain(|key, entry| {
            entry.is_pending() || entry.fetched_at >= cutoff || is_referenced(views, key)
        });
    }

    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let max_age = TimeDelta::from_std(self.policy.max_age).ok()?;
        now.checked_sub_signed(max_age)
    }

    fn evict(&mut self) {
        while self.entries.len() > self.policy.max_entries {
            let oldest = self
                .entries
                .values()
                .filter(|entry| !entry.is_pending() && !is_referenced(&self.views, &entry.key))
                .min_by_key(|entry| entry.fetched_at)
                .map(|entry| entry.key.clone());
            match oldest {
                Some(key) => {
                    log::debug!("Evicting {key}");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

fn is_referenced(views: &HashMap<ViewId, ViewSlot>, key: &ResultCacheKey) -> bool {
    views.values().any(|slot| slot.current.as_ref() == Some(key))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::domain::filter::SearchFilter;
    use crate::domain::listing::Listing;

    #[derive(Default)]
    struct RecordingDispatcher {
        calls: RefCell<Vec<ResultCacheKey>>,
    }

    impl FetchDispatcher for RecordingDispatcher {
        fn dispatch(&self, key: ResultCacheKey, _request: PageRequest) {
            self.calls.borrow_mut().push(key);
        }
    }

    fn request(location: &str, page: usize) -> PageRequest {
        let filter = SearchFilter::builder().location(location).build().unwrap();
        PageRequest::new(filter, page, 18)
    }

    fn page(total: usize) -> ResultPage {
        ResultPage {
            items: vec![Listing {
                id: "l-1".to_string(),
                title: "Villa".to_string(),
                nightly_price: 100.0,
                location: None,
                rating: None,
                instant_book: false,
                thumbnail_url: None,
                details: Default::default(),
            }],
            total,
        }
    }

    #[test]
    fn repeated_request_is_deduplicated() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let req = request("Bali", 1);

        let first = cache.get_or_fetch(view, &req, &dispatcher);
        let second = cache.get_or_fetch(view, &req, &dispatcher);

        assert!(first.is_pending());
        assert!(second.is_pending());
        assert_eq!(dispatcher.calls.borrow().len(), 1);

        cache.resolve(&req.cache_key(), Ok(page(1))).unwrap();
        let third = cache.get_or_fetch(view, &req, &dispatcher);
        assert!(third.is_ready());
        assert_eq!(dispatcher.calls.borrow().len(), 1);
    }

    #[test]
    fn failed_entry_is_refetched() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let req = request("Bali", 1);

        cache.get_or_fetch(view, &req, &dispatcher);
        let failed = cache
            .resolve(
                &req.cache_key(),
                Err(ErrorInfo::new(FailureKind::Network, "offline")),
            )
            .unwrap();
        assert_eq!(failed.status, EntryStatus::Failed);
        assert_eq!(failed.error.unwrap().message, "offline");

        let retried = cache.get_or_fetch(view, &req, &dispatcher);
        assert!(retried.is_pending());
        assert_eq!(dispatcher.calls.borrow().len(), 2);
    }

    #[test]
    fn entry_settles_exactly_once() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let req = request("Bali", 1);
        cache.get_or_fetch(view, &req, &RecordingDispatcher::default());

        assert!(cache.resolve(&req.cache_key(), Ok(page(5))).is_some());
        assert!(
            cache
                .resolve(&req.cache_key(), Err(ErrorInfo::new(FailureKind::Server, "late")))
                .is_none()
        );
        assert!(cache.entry(&req.cache_key()).unwrap().is_ready());
        assert!(cache.resolve(&request("Oslo", 1).cache_key(), Ok(page(1))).is_none());
    }

    #[test]
    fn previous_ready_entry_stays_available_while_next_loads() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let first = request("Bali", 1);
        let second = request("Bali", 2);

        cache.get_or_fetch(view, &first, &dispatcher);
        cache.resolve(&first.cache_key(), Ok(page(40)));
        cache.get_or_fetch(view, &second, &dispatcher);

        assert!(cache.current_entry(view).unwrap().is_pending());
        assert_eq!(cache.last_ready_entry(view).unwrap().key, first.cache_key());

        cache.resolve(&second.cache_key(), Ok(page(40)));
        assert_eq!(cache.last_ready_entry(view).unwrap().key, second.cache_key());
    }

    #[test]
    fn abandoned_key_does_not_become_last_ready() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let a = request("Bali", 1);
        let b = request("Oslo", 1);

        cache.get_or_fetch(view, &a, &dispatcher);
        cache.get_or_fetch(view, &b, &dispatcher);
        cache.resolve(&b.cache_key(), Ok(page(2)));
        cache.resolve(&a.cache_key(), Ok(page(3)));

        assert_eq!(cache.last_ready_entry(view).unwrap().key, b.cache_key());
        assert!(cache.entry(&a.cache_key()).unwrap().is_ready());
    }

    #[test]
    fn invalidate_keeps_pending_entries() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let ready = request("Bali", 1);
        let pending = request("Bali", 2);

        cache.get_or_fetch(view, &ready, &dispatcher);
        cache.resolve(&ready.cache_key(), Ok(page(40)));
        cache.get_or_fetch(view, &pending, &dispatcher);

        let removed = cache.invalidate(|_| true);

        assert_eq!(removed, 1);
        assert!(cache.entry(&ready.cache_key()).is_none());
        assert!(cache.entry(&pending.cache_key()).unwrap().is_pending());
    }

    #[test]
    fn eviction_drops_oldest_unreferenced_settled_entries() {
        let mut cache = ResultCache::new(CachePolicy {
            max_entries: 2,
            ..CachePolicy::default()
        });
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();

        for location in ["A", "B", "C"] {
            let req = request(location, 1);
            cache.get_or_fetch(view, &req, &dispatcher);
            cache.resolve(&req.cache_key(), Ok(page(1)));
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.entry(&request("A", 1).cache_key()).is_none());
        assert!(cache.entry(&request("C", 1).cache_key()).is_some());
    }

    #[test]
    fn pending_entries_survive_eviction() {
        let mut cache = ResultCache::new(CachePolicy {
            max_entries: 1,
            ..CachePolicy::default()
        });
        let view = cache.register_view();
        let dispatcher = RecordingDispatcher::default();

        cache.get_or_fetch(view, &request("A", 1), &dispatcher);
        cache.get_or_fetch(view, &request("B", 1), &dispatcher);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn refetch_by_another_view_keeps_shown_data() {
        let mut cache = ResultCache::new(CachePolicy {
            max_age: Duration::from_millis(1),
            ..CachePolicy::default()
        });
        let first = cache.register_view();
        let second = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let req = request("Bali", 1);

        cache.get_or_fetch(first, &req, &dispatcher);
        cache.resolve(&req.cache_key(), Ok(page(40)));
        std::thread::sleep(Duration::from_millis(10));

        let refetch = cache.get_or_fetch(second, &req, &dispatcher);
        assert!(refetch.is_pending());
        assert_eq!(dispatcher.calls.borrow().len(), 2);
        assert_eq!(cache.last_ready_entry(first).unwrap().data.as_ref().unwrap().total, 40);

        cache.resolve(
            &req.cache_key(),
            Err(ErrorInfo::new(FailureKind::Network, "offline")),
        );
        let shown = cache.last_ready_entry(first).unwrap();
        assert!(shown.is_ready());
        assert_eq!(shown.data.as_ref().unwrap().items.len(), 1);
        assert!(cache.last_ready_entry(second).is_none());
    }

    #[test]
    fn invalidated_entry_stays_as_last_ready() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let req = request("Bali", 1);
        cache.get_or_fetch(view, &req, &RecordingDispatcher::default());
        cache.resolve(&req.cache_key(), Ok(page(1)));

        assert_eq!(cache.invalidate(|_| true), 1);

        assert!(cache.current_entry(view).is_none());
        assert_eq!(cache.last_ready_entry(view).unwrap().key, req.cache_key());
    }

    #[test]
    fn expired_entries_are_refetched() {
        let mut cache = ResultCache::default();
        let view = cache.register_view();
        let other = cache.register_view();
        let dispatcher = RecordingDispatcher::default();
        let req = request("Bali", 1);

        cache.get_or_fetch(view, &req, &dispatcher);
        cache.resolve(&req.cache_key(), Ok(page(1)));
        cache.get_or_fetch(view, &request("Oslo", 1), &dispatcher);
        cache.release_view(view);

        cache.expire(Utc::now() + TimeDelta::minutes(10));
        assert!(cache.entry(&req.cache_key()).is_none());

        cache.get_or_fetch(other, &req, &dispatcher);
        assert_eq!(dispatcher.calls.borrow().len(), 3);
    }
}
