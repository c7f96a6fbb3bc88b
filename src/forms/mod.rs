//! Form definitions backing the search views.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::filter::FilterError;
use crate::domain::types::TypeConstraintError;

pub mod search;

#[derive(Debug, Error)]
/// Errors that can occur when turning a draft form into a filter.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid amenity: {0}")]
    InvalidAmenity(String),

    #[error("invalid {field}: {source}")]
    InvalidValue {
        field: &'static str,
        source: TypeConstraintError,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl FormError {
    /// Names of the offending form fields, for inline error display.
    pub fn fields(&self) -> Vec<String> {
        match self {
            FormError::Validation(errors) => {
                let mut fields: Vec<String> = errors.errors().keys().map(|k| k.to_string()).collect();
                fields.sort();
                fields
            }
            FormError::InvalidAmenity(_) => vec!["amenities".to_string()],
            FormError::InvalidValue { field, .. } => vec![field.to_string()],
            FormError::Filter(err) => vec![err.field().to_string()],
        }
    }
}
