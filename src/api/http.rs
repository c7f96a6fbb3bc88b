use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::api::{FetchError, ListingsApi};
use crate::domain::listing::ResultPage;
use crate::domain::request::PageRequest;
use crate::query;

/// Listings backend reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpListingsApi {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ServerMessage {
    message: Option<String>,
}

impl HttpListingsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Full URL for a page request.
    pub fn listings_url(&self, request: &PageRequest) -> Result<String, FetchError> {
        let mut params = query::encode(&request.filter);
        params.insert(query::PAGE.to_string(), request.page.to_string());
        params.insert("page_size".to_string(), request.page_size.to_string());
        let query = query::to_query_string(&params)
            .map_err(|e| FetchError::Transport(format!("cannot encode request: {e}")))?;
        Ok(format!("{}/listings?{query}", self.base_url))
    }
}

#[async_trait]
impl ListingsApi for HttpListingsApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage, FetchError> {
        let url = self.listings_url(request)?;
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            log::warn!("Listings backend returned {status} for {url}");
            let message = serde_json::from_slice::<ServerMessage>(&body)
                .ok()
                .and_then(|m| m.message);
            return Err(FetchError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(ResultPage::from_json(&body)?)
    }
}
