//! The canonical search intent shared by every search-bearing view.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::types::{Amenity, GuestCount, Price, Rating, SortOrder};

/// Cross-field invariant violations detected while building a filter.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    #[error("check-out date precedes check-in date")]
    CheckOutBeforeCheckIn,
    #[error("minimum price exceeds maximum price")]
    PriceRangeInverted,
}

impl FilterError {
    /// Name of the form field the error should be displayed next to.
    pub const fn field(self) -> &'static str {
        match self {
            FilterError::CheckOutBeforeCheckIn => "check_out",
            FilterError::PriceRangeInverted => "price_max",
        }
    }
}

/// Immutable, validated search filter.
///
/// Instances are only produced by [`SearchFilterBuilder::build`], so the date
/// and price ordering invariants always hold. Every change yields a new value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter {
    location: String,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guest_count: GuestCount,
    amenities: BTreeSet<Amenity>,
    price_min: Option<Price>,
    price_max: Option<Price>,
    instant_book_only: Option<bool>,
    min_rating: Option<Rating>,
    sort: SortOrder,
}

impl SearchFilter {
    pub fn builder() -> SearchFilterBuilder {
        SearchFilterBuilder::default()
    }

    /// Starts a builder pre-populated with this filter's values.
    pub fn to_builder(&self) -> SearchFilterBuilder {
        SearchFilterBuilder {
            inner: self.clone(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    pub fn guest_count(&self) -> GuestCount {
        self.guest_count
    }

    pub fn amenities(&self) -> &BTreeSet<Amenity> {
        &self.amenities
    }

    pub fn price_min(&self) -> Option<Price> {
        self.price_min
    }

    pub fn price_max(&self) -> Option<Price> {
        self.price_max
    }

    pub fn instant_book_only(&self) -> Option<bool> {
        self.instant_book_only
    }

    pub fn min_rating(&self) -> Option<Rating> {
        self.min_rating
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Returns a copy of the filter with a different sort order.
    ///
    /// Sorting never participates in an invariant, so this cannot fail.
    #[must_use]
    pub fn with_sort(&self, sort: SortOrder) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }
}

/// Builder validating the cross-field invariants of [`SearchFilter`].
#[derive(Clone, Debug, Default)]
pub struct SearchFilterBuilder {
    inner: SearchFilter,
}

impl SearchFilterBuilder {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.inner.location = location.into().trim().to_string();
        self
    }

    pub fn check_in(mut self, date: Option<NaiveDate>) -> Self {
        self.inner.check_in = date;
        self
    }

    pub fn check_out(mut self, date: Option<NaiveDate>) -> Self {
        self.inner.check_out = date;
        self
    }

    pub fn guest_count(mut self, guests: GuestCount) -> Self {
        self.inner.guest_count = guests;
        self
    }

    pub fn amenity(mut self, amenity: Amenity) -> Self {
        self.inner.amenities.insert(amenity);
        self
    }

    pub fn amenities(mut self, amenities: impl IntoIterator<Item = Amenity>) -> Self {
        self.inner.amenities = amenities.into_iter().collect();
        self
    }

    pub fn price_min(mut self, price: Option<Price>) -> Self {
        self.inner.price_min = price;
        self
    }

    pub fn price_max(mut self, price: Option<Price>) -> Self {
        self.inner.price_max = price;
        self
    }

    pub fn instant_book_only(mut self, instant: Option<bool>) -> Self {
        self.inner.instant_book_only = instant;
        self
    }

    pub fn min_rating(mut self, rating: Option<Rating>) -> Self {
        self.inner.min_rating = rating;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.inner.sort = sort;
        self
    }

    /// Checks the invariants and returns the finished filter.
    pub fn build(self) -> Result<SearchFilter, FilterError> {
        let filter = self.inner;
        if let (Some(check_in), Some(check_out)) = (filter.check_in, filter.check_out) {
            if check_out < check_in {
                return Err(FilterError::CheckOutBeforeCheckIn);
            }
        }
        if let (Some(min), Some(max)) = (filter.price_min, filter.price_max) {
            if min.get() > max.get() {
                return Err(FilterError::PriceRangeInverted);
            }
        }
        Ok(filter)
    }
}
