#![allow(dead_code)]

use std::cell::RefCell;
use std::path::PathBuf;

use pushkind_stays::cache::{FetchDispatcher, ResultCache};
use pushkind_stays::domain::listing::{Listing, ResultPage};
use pushkind_stays::domain::request::{PageRequest, ResultCacheKey};
use pushkind_stays::domain::types::ViewName;
use pushkind_stays::repository::{InMemoryRepository, JsonFileRepository};
use pushkind_stays::services::search::{SearchContext, SearchController};
use pushkind_stays::store::PersistedQueryStore;
use tempfile::TempDir;

/// Storage file inside a temporary directory removed on drop.
pub struct TestStorage {
    dir: TempDir,
    name: String,
}

impl TestStorage {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        Self {
            dir,
            name: name.to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join(&self.name)
    }

    pub fn repo(&self) -> JsonFileRepository {
        JsonFileRepository::new(self.path())
    }
}

/// Records dispatched requests instead of fetching them.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub requests: RefCell<Vec<(ResultCacheKey, PageRequest)>>,
}

impl RecordingDispatcher {
    pub fn count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last(&self) -> Option<PageRequest> {
        self.requests.borrow().last().map(|(_, req)| req.clone())
    }
}

impl FetchDispatcher for RecordingDispatcher {
    fn dispatch(&self, key: ResultCacheKey, request: PageRequest) {
        self.requests.borrow_mut().push((key, request));
    }
}

pub type TestContext = SearchContext<InMemoryRepository, RecordingDispatcher>;
pub type TestController = SearchController<InMemoryRepository, RecordingDispatcher>;

pub fn context() -> TestContext {
    SearchContext::new(
        ResultCache::default(),
        PersistedQueryStore::hydrate(InMemoryRepository::new()),
        RecordingDispatcher::default(),
    )
}

pub fn controller(ctx: &TestContext, view: &str) -> TestController {
    SearchController::new(ctx.clone(), ViewName::new(view).unwrap(), 18)
}

/// A page of `count` listings out of `total`, ids prefixed with `prefix`.
pub fn page(prefix: &str, count: usize, total: usize) -> ResultPage {
    ResultPage {
        items: (0..count)
            .map(|i| Listing {
                id: format!("{prefix}-{i}"),
                title: format!("{prefix} {i}"),
                nightly_price: 95.0,
                location: Some(prefix.to_string()),
                rating: Some(4.8),
                instant_book: false,
                thumbnail_url: None,
                details: Default::default(),
            })
            .collect(),
        total,
    }
}
