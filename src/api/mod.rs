//! Async boundary to the listings backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::{ErrorInfo, FailureKind};
use crate::domain::listing::{PayloadError, ResultPage};
use crate::domain::request::PageRequest;

pub mod http;

pub use http::HttpListingsApi;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with {status}")]
    Server { status: u16, message: Option<String> },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<PayloadError> for FetchError {
    fn from(err: PayloadError) -> Self {
        FetchError::InvalidPayload(err.to_string())
    }
}

impl From<FetchError> for ErrorInfo {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(_) => ErrorInfo::new(
                FailureKind::Network,
                "Не удалось связаться с сервером. Проверьте подключение.",
            ),
            FetchError::Server { status, message } => ErrorInfo::new(
                FailureKind::Server,
                message.unwrap_or_else(|| format!("Ошибка сервера ({status}).")),
            ),
            FetchError::InvalidPayload(_) => ErrorInfo::new(
                FailureKind::InvalidPayload,
                "Сервер вернул некорректные данные.",
            ),
        }
    }
}

/// Source of listing pages.
#[async_trait]
pub trait ListingsApi: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage, FetchError>;
}
