//! Durable storage for the last-search record.

use crate::domain::record::PersistedSearchRecord;
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod file;
pub mod memory;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;

pub trait SearchRecordReader {
    fn load_search_record(&self) -> RepositoryResult<Option<PersistedSearchRecord>>;
}

pub trait SearchRecordWriter {
    fn save_search_record(&self, record: &PersistedSearchRecord) -> RepositoryResult<()>;
    fn clear_search_record(&self) -> RepositoryResult<()>;
}
