//! Search record stored as a single JSON document on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::record::PersistedSearchRecord;
use crate::repository::errors::RepositoryResult;
use crate::repository::{SearchRecordReader, SearchRecordWriter};

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SearchRecordReader for JsonFileRepository {
    fn load_search_record(&self) -> RepositoryResult<Option<PersistedSearchRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let record = serde_json::from_slice(&bytes)?;
        Ok(Some(record))
    }
}

impl SearchRecordWriter for JsonFileRepository {
    fn save_search_record(&self, record: &PersistedSearchRecord) -> RepositoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(record)?;
        // Readers never observe a half-written record.
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear_search_record(&self) -> RepositoryResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::SearchFilter;
    use crate::domain::types::{SortOrder, ViewName};
    use crate::repository::errors::RepositoryError;

    fn record() -> PersistedSearchRecord {
        let filter = SearchFilter::builder()
            .location("Bali")
            .sort(SortOrder::PriceDesc)
            .build()
            .unwrap();
        PersistedSearchRecord::new(filter, ViewName::new("home").unwrap())
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("last_search.json"));

        assert!(repo.load_search_record().unwrap().is_none());
        repo.clear_search_record().unwrap();
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("state/last_search.json"));
        let record = record();

        repo.save_search_record(&record).unwrap();
        let loaded = repo.load_search_record().unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(!repo.temp_path().exists());

        repo.clear_search_record().unwrap();
        assert!(repo.load_search_record().unwrap().is_none());
    }

    #[test]
    fn filter_is_stored_as_query_params() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("last_search.json"));

        repo.save_search_record(&record()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(repo.path()).unwrap()).unwrap();
        assert_eq!(raw["filter"]["location"], "Bali");
        assert_eq!(raw["filter"]["sort"], "price_desc");
        assert_eq!(raw["source_view"], "home");
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_search.json");
        fs::write(&path, b"{not json").unwrap();

        let result = JsonFileRepository::new(path).load_search_record();

        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }
}
