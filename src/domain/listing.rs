//! Typed contract for listing pages returned by the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a backend payload is rejected at the fetch boundary.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("total {total} is smaller than the {items} returned items")]
    TotalBelowItems { total: usize, items: usize },
    #[error("listing {0} has an invalid nightly price")]
    InvalidPrice(String),
    #[error("listing with an empty id")]
    EmptyId,
}

/// Single rental listing as shown on a result card.
///
/// Fields the presentation layer needs are typed; anything else the backend
/// sends is carried through untouched in `details`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub nightly_price: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub instant_book: bool,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// One page of search results.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Listing>,
    pub total: usize,
}

impl ResultPage {
    /// Parses and validates a JSON payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PayloadError> {
        let page: ResultPage =
            serde_json::from_slice(bytes).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        page.validate()?;
        Ok(page)
    }

    /// Checks the invariants a well-formed page must satisfy.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.total < self.items.len() {
            return Err(PayloadError::TotalBelowItems {
                total: self.total,
                items: self.items.len(),
            });
        }
        for listing in &self.items {
            if listing.id.trim().is_empty() {
                return Err(PayloadError::EmptyId);
            }
            if !listing.nightly_price.is_finite() || listing.nightly_price < 0.0 {
                return Err(PayloadError::InvalidPrice(listing.id.clone()));
            }
        }
        Ok(())
    }

    /// Number of pages needed to show `total` results.
    pub fn total_pages(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_payload_and_keeps_unknown_fields() {
        let body = br#"{
            "items": [
                {"id": "l-1", "title": "Villa", "nightly_price": 120.0, "bedrooms": 3}
            ],
            "total": 40
        }"#;

        let page = ResultPage::from_json(body).unwrap();

        assert_eq!(page.total, 40);
        assert_eq!(page.items[0].title, "Villa");
        assert!(!page.items[0].instant_book);
        assert_eq!(page.items[0].details["bedrooms"], Value::from(3));
        assert_eq!(page.total_pages(18), 3);
    }

    #[test]
    fn rejects_missing_required_fields() {
        let body = br#"{"items": [{"id": "l-1"}], "total": 1}"#;
        assert!(matches!(
            ResultPage::from_json(body),
            Err(PayloadError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_inconsistent_total() {
        let body = br#"{"items": [{"id": "a", "title": "A", "nightly_price": 1}], "total": 0}"#;
        assert_eq!(
            ResultPage::from_json(body),
            Err(PayloadError::TotalBelowItems { total: 0, items: 1 })
        );
    }

    #[test]
    fn rejects_negative_price() {
        let body = br#"{"items": [{"id": "a", "title": "A", "nightly_price": -5}], "total": 1}"#;
        assert_eq!(
            ResultPage::from_json(body),
            Err(PayloadError::InvalidPrice("a".to_string()))
        );
    }
}
