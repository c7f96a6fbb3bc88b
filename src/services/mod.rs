use thiserror::Error;

use crate::forms::FormError;

pub mod search;

/// Errors returned by view controller operations. None of them is fatal:
/// the view stays interactive and the user can resubmit.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation rejected: {0}")]
    Validation(#[from] FormError),

    #[error("no search is applied to this view")]
    NoActiveSearch,

    #[error("view is not mounted")]
    NotMounted,

    #[error("view is already mounted")]
    AlreadyMounted,

    #[error("view was torn down")]
    TornDown,

    #[error("failed to encode query string: {0}")]
    QueryEncoding(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
