//! Draft state of the search form.
//!
//! The draft may be incomplete or invalid while the user edits it; only a
//! successful conversion into a [`SearchFilter`] is ever applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::filter::SearchFilter;
use crate::domain::types::{Amenity, GuestCount, Price, Rating, SortOrder};
use crate::forms::FormError;

fn default_guests() -> i64 {
    i64::from(GuestCount::MIN)
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate, PartialEq)]
/// Form data for the search box and filter panel.
pub struct SearchForm {
    /// Destination typed by the guest.
    #[serde(default)]
    #[validate(length(max = 128))]
    pub location: String,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    /// Number of guests, `1..=20`.
    #[serde(default = "default_guests")]
    #[validate(range(min = 1, max = 20))]
    pub guests: i64,
    /// Selected amenity labels.
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price_min: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub instant_book_only: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub min_rating: Option<i64>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            location: String::new(),
            check_in: None,
            check_out: None,
            guests: default_guests(),
            amenities: Vec::new(),
            price_min: None,
            price_max: None,
            instant_book_only: None,
            min_rating: None,
            sort: SortOrder::default(),
        }
    }
}

impl TryFrom<&SearchForm> for SearchFilter {
    type Error = FormError;

    fn try_from(form: &SearchForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let guests = GuestCount::new(form.guests).map_err(|source| FormError::InvalidValue {
            field: "guests",
            source,
        })?;
        let amenities = form
            .amenities
            .iter()
            .filter(|label| !label.trim().is_empty())
            .map(|label| Amenity::new(label.as_str()).map_err(|_| FormError::InvalidAmenity(label.clone())))
            .collect::<Result<Vec<Amenity>, FormError>>()?;
        let price_min = form
            .price_min
            .map(Price::new)
            .transpose()
            .map_err(|source| FormError::InvalidValue {
                field: "price_min",
                source,
            })?;
        let price_max = form
            .price_max
            .map(Price::new)
            .transpose()
            .map_err(|source| FormError::InvalidValue {
                field: "price_max",
                source,
            })?;
        let min_rating = form
            .min_rating
            .map(Rating::new)
            .transpose()
            .map_err(|source| FormError::InvalidValue {
                field: "min_rating",
                source,
            })?;

        let filter = SearchFilter::builder()
            .location(form.location.as_str())
            .check_in(form.check_in)
            .check_out(form.check_out)
            .guest_count(guests)
            .amenities(amenities)
            .price_min(price_min)
            .price_max(price_max)
            .instant_book_only(form.instant_book_only)
            .min_rating(min_rating)
            .sort(form.sort)
            .build()?;

        Ok(filter)
    }
}

impl From<&SearchFilter> for SearchForm {
    /// Pre-fills the form from an applied or remembered filter.
    fn from(filter: &SearchFilter) -> Self {
        Self {
            location: filter.location().to_string(),
            check_in: filter.check_in(),
            check_out: filter.check_out(),
            guests: i64::from(filter.guest_count().get()),
            amenities: filter
                .amenities()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            price_min: filter.price_min().map(Price::get),
            price_max: filter.price_max().map(Price::get),
            instant_book_only: filter.instant_book_only(),
            min_rating: filter.min_rating().map(|r| i64::from(r.get())),
            sort: filter.sort(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::FilterError;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn valid_form_becomes_filter() {
        let form = SearchForm {
            location: "  Lisbon ".to_string(),
            guests: 3,
            amenities: vec!["WiFi".to_string(), "".to_string()],
            price_max: Some(500.0),
            ..SearchForm::default()
        };

        let filter = SearchFilter::try_from(&form).unwrap();

        assert_eq!(filter.location(), "Lisbon");
        assert_eq!(filter.guest_count().get(), 3);
        assert_eq!(filter.amenities().len(), 1);
        assert_eq!(filter.price_max().map(Price::get), Some(500.0));
    }

    #[test]
    fn inverted_dates_are_rejected_at_check_out() {
        let form = SearchForm {
            check_in: date(2025, 6, 10),
            check_out: date(2025, 6, 5),
            ..SearchForm::default()
        };

        let err = SearchFilter::try_from(&form).unwrap_err();

        assert!(matches!(
            err,
            FormError::Filter(FilterError::CheckOutBeforeCheckIn)
        ));
        assert_eq!(err.fields(), vec!["check_out".to_string()]);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let form = SearchForm {
            guests: 0,
            min_rating: Some(7),
            price_min: Some(-10.0),
            ..SearchForm::default()
        };

        let err = SearchFilter::try_from(&form).unwrap_err();

        assert!(matches!(err, FormError::Validation(_)));
        assert_eq!(
            err.fields(),
            vec![
                "guests".to_string(),
                "min_rating".to_string(),
                "price_min".to_string()
            ]
        );
    }

    #[test]
    fn amenity_with_comma_is_rejected() {
        let form = SearchForm {
            amenities: vec!["pool,spa".to_string()],
            ..SearchForm::default()
        };

        let err = SearchFilter::try_from(&form).unwrap_err();
        assert_eq!(err.fields(), vec!["amenities".to_string()]);
    }

    #[test]
    fn filter_prefills_form() {
        let filter = SearchFilter::builder()
            .location("Bali")
            .guest_count(GuestCount::new(2).unwrap())
            .sort(SortOrder::Rating)
            .build()
            .unwrap();

        let form = SearchForm::from(&filter);

        assert_eq!(form.location, "Bali");
        assert_eq!(form.guests, 2);
        assert_eq!(form.sort, SortOrder::Rating);
        assert_eq!(SearchFilter::try_from(&form).unwrap(), filter);
    }
}
