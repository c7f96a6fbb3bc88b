//! Strongly-typed value objects used by the search domain.
//!
//! These wrappers enforce basic invariants (guest count range, rating bounds,
//! non-negative prices, comma-free amenity names) so that once a value
//! reaches a [`SearchFilter`](crate::domain::filter::SearchFilter) it can be
//! treated as trusted.
use std::{ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided number fell outside the accepted range.
    #[error("value {value} is outside of {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    /// Provided price was negative or not a finite number.
    #[error("price must be a non-negative number")]
    InvalidPrice,
    /// Provided sort order is not one of the known values.
    #[error("unknown sort order: {0}")]
    UnknownSort(String),
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(
    ViewName,
    "Name of the view that produced a search, e.g. `home` or `search`."
);

impl ViewName {
    /// Constructs a trimmed, non-empty view name.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let inner = NonEmptyString::new(value)?;
        Ok(Self(inner.into_inner()))
    }
}

non_empty_string_newtype!(
    Amenity,
    "Amenity filter label enforcing trimmed, lower-cased, comma-free values."
);

impl Amenity {
    /// Normalizes an amenity label and rejects values that would break the
    /// comma-joined query encoding.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let inner = NonEmptyString::new(value)?.into_inner().to_lowercase();
        if inner.contains(',') {
            return Err(TypeConstraintError::InvalidValue(inner));
        }
        Ok(Self(inner))
    }
}

/// Number of guests travelling, always within `1..=20`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuestCount(u8);

impl GuestCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 20;

    /// Creates a guest count, rejecting values outside of `1..=20`.
    pub fn new(value: i64) -> Result<Self, TypeConstraintError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TypeConstraintError::OutOfRange {
                value,
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            })
        }
    }

    /// Creates a guest count, clamping the value into `1..=20`.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Returns the raw number of guests.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for GuestCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl Display for GuestCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum star rating, `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a rating ensuring it lies within `1..=5`.
    pub fn new(value: i64) -> Result<Self, TypeConstraintError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TypeConstraintError::OutOfRange {
                value,
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            })
        }
    }

    /// Returns the raw rating.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative, finite nightly price bound.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Creates a price bound, rejecting negative and non-finite values.
    pub fn new(value: f64) -> Result<Self, TypeConstraintError> {
        if value.is_finite() && value >= 0.0 {
            // Normalizes `-0.0` so that equal prices encode identically.
            Ok(Self(value + 0.0))
        } else {
            Err(TypeConstraintError::InvalidPrice)
        }
    }

    /// Returns the raw amount.
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| TypeConstraintError::InvalidPrice)?;
        Self::new(value)
    }
}

/// Ordering applied to search results.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Popularity,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl SortOrder {
    /// Returns the wire representation used in query strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::Rating => "rating",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "popularity" => Ok(SortOrder::Popularity),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "rating" => Ok(SortOrder::Rating),
            other => Err(TypeConstraintError::UnknownSort(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_count_rejects_out_of_range() {
        assert!(GuestCount::new(0).is_err());
        assert!(GuestCount::new(21).is_err());
        assert_eq!(GuestCount::new(20).unwrap().get(), 20);
    }

    #[test]
    fn guest_count_clamps_into_range() {
        assert_eq!(GuestCount::clamped(-3).get(), 1);
        assert_eq!(GuestCount::clamped(99).get(), 20);
        assert_eq!(GuestCount::clamped(4).get(), 4);
        assert_eq!(GuestCount::default().get(), 1);
    }

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).unwrap().get(), 5);
    }

    #[test]
    fn price_rejects_negative_and_nan() {
        assert_eq!(Price::new(-1.0), Err(TypeConstraintError::InvalidPrice));
        assert_eq!(Price::new(f64::NAN), Err(TypeConstraintError::InvalidPrice));
        assert_eq!("abc".parse::<Price>(), Err(TypeConstraintError::InvalidPrice));
        assert_eq!("49.5".parse::<Price>().unwrap().get(), 49.5);
    }

    #[test]
    fn amenity_is_normalized() {
        let amenity = Amenity::new("  WiFi ").unwrap();
        assert_eq!(amenity.as_str(), "wifi");
        assert!(Amenity::new("pool,spa").is_err());
        assert_eq!(Amenity::new("   "), Err(TypeConstraintError::EmptyString));
    }

    #[test]
    fn sort_order_parses_wire_values() {
        assert_eq!("price_desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDesc);
        assert!("cheapest".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default().as_str(), "popularity");
    }
}
