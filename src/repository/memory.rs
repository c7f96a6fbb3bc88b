//! Process-local search record storage.

use std::sync::Mutex;

use crate::domain::record::PersistedSearchRecord;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{SearchRecordReader, SearchRecordWriter};

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    record: Mutex<Option<PersistedSearchRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PersistedSearchRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

fn poisoned<E>(_: E) -> RepositoryError {
    RepositoryError::Unexpected("search record lock poisoned".to_string())
}

impl SearchRecordReader for InMemoryRepository {
    fn load_search_record(&self) -> RepositoryResult<Option<PersistedSearchRecord>> {
        Ok(self.record.lock().map_err(poisoned)?.clone())
    }
}

impl SearchRecordWriter for InMemoryRepository {
    fn save_search_record(&self, record: &PersistedSearchRecord) -> RepositoryResult<()> {
        *self.record.lock().map_err(poisoned)? = Some(record.clone());
        Ok(())
    }

    fn clear_search_record(&self) -> RepositoryResult<()> {
        *self.record.lock().map_err(poisoned)? = None;
        Ok(())
    }
}
