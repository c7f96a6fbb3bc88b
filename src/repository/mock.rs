//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::record::PersistedSearchRecord;
use crate::repository::errors::RepositoryResult;
use crate::repository::{SearchRecordReader, SearchRecordWriter};

mock! {
    pub Repository {}

    impl SearchRecordReader for Repository {
        fn load_search_record(&self) -> RepositoryResult<Option<PersistedSearchRecord>>;
    }

    impl SearchRecordWriter for Repository {
        fn save_search_record(&self, record: &PersistedSearchRecord) -> RepositoryResult<()>;
        fn clear_search_record(&self) -> RepositoryResult<()>;
    }
}
