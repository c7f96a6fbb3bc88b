use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::filter::SearchFilter;
use crate::domain::types::ViewName;

/// The last search submitted from any view.
///
/// Serialized with the filter in its query-parameter form, so a record
/// written by an older build is decoded with the current defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistedSearchRecord {
    pub filter: SearchFilter,
    pub source_view: ViewName,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSearchRecord {
    pub fn new(filter: SearchFilter, source_view: ViewName) -> Self {
        Self {
            filter,
            source_view,
            saved_at: Utc::now(),
        }
    }
}
