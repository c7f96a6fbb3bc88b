//! Process-wide "last search" record used to pre-fill search boxes.
//!
//! The store is a prefill hint, never the source of the current results: a
//! search view always derives its applied filter from the URL.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::filter::SearchFilter;
use crate::domain::record::PersistedSearchRecord;
use crate::domain::types::ViewName;
use crate::repository::{SearchRecordReader, SearchRecordWriter};

/// Handle shared by every view controller of the application.
pub type SharedQueryStore<R> = Rc<RefCell<PersistedQueryStore<R>>>;

pub struct PersistedQueryStore<R> {
    repo: R,
    current: Option<PersistedSearchRecord>,
}

impl<R> PersistedQueryStore<R> {
    /// Wraps the store into a shared handle.
    pub fn shared(self) -> SharedQueryStore<R> {
        Rc::new(RefCell::new(self))
    }

    pub fn get(&self) -> Option<&PersistedSearchRecord> {
        self.current.as_ref()
    }
}

impl<R> PersistedQueryStore<R>
where
    R: SearchRecordReader + SearchRecordWriter,
{
    /// Creates the store, hydrating it from durable storage.
    ///
    /// An unreadable record is treated as absent; the application starts with
    /// an empty store rather than failing.
    pub fn hydrate(repo: R) -> Self {
        let current = match repo.load_search_record() {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Failed to load the last search record, starting empty: {err}");
                None
            }
        };
        Self { repo, current }
    }

    /// Replaces the record with the given filter (last write wins).
    pub fn set(&mut self, filter: SearchFilter, source_view: ViewName) {
        let record = PersistedSearchRecord::new(filter, source_view);
        if let Err(err) = self.repo.save_search_record(&record) {
            log::error!("Failed to persist the last search record: {err}");
        }
        self.current = Some(record);
    }

    /// Wipes the record, e.g. on logout.
    pub fn clear(&mut self) {
        if let Err(err) = self.repo.clear_search_record() {
            log::error!("Failed to clear the last search record: {err}");
        }
        self.current = None;
    }
}
