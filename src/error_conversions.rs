//! Conversions from foreign error types into service errors.

use crate::services::ServiceError;

impl From<serde_html_form::ser::Error> for ServiceError {
    fn from(val: serde_html_form::ser::Error) -> Self {
        ServiceError::QueryEncoding(val.to_string())
    }
}
