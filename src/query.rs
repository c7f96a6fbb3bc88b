//! Mapping between [`SearchFilter`] values and URL query parameters.
//!
//! Encoding omits empty values, absent optionals, an empty amenity set and the
//! default `popularity` sort. `number_of_guests` is always written, even when
//! it holds the default of 1, so shared links state the party size
//! explicitly. Decoding never fails: malformed or out-of-range values fall
//! back to the field default.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::filter::SearchFilter;
use crate::domain::types::{Amenity, GuestCount, Price, Rating, SortOrder};

/// Flat, string-keyed query parameters in stable key order.
pub type QueryParams = BTreeMap<String, String>;

pub const LOCATION: &str = "location";
pub const CHECK_IN: &str = "check_in";
pub const CHECK_OUT: &str = "check_out";
pub const GUESTS: &str = "number_of_guests";
pub const AMENITIES: &str = "amenities";
pub const PRICE_MIN: &str = "price_min";
pub const PRICE_MAX: &str = "price_max";
pub const INSTANT_BOOK: &str = "instant_book";
pub const MIN_RATING: &str = "min_rating";
pub const SORT: &str = "sort";
pub const PAGE: &str = "page";

/// Keys that describe a search; `page` alone does not make a search.
const FILTER_KEYS: [&str; 10] = [
    LOCATION,
    CHECK_IN,
    CHECK_OUT,
    GUESTS,
    AMENITIES,
    PRICE_MIN,
    PRICE_MAX,
    INSTANT_BOOK,
    MIN_RATING,
    SORT,
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encodes a filter into query parameters.
pub fn encode(filter: &SearchFilter) -> QueryParams {
    let mut params = QueryParams::new();

    if !filter.location().is_empty() {
        params.insert(LOCATION.to_string(), filter.location().to_string());
    }
    if let Some(date) = filter.check_in() {
        params.insert(CHECK_IN.to_string(), date.format(DATE_FORMAT).to_string());
    }
    if let Some(date) = filter.check_out() {
        params.insert(CHECK_OUT.to_string(), date.format(DATE_FORMAT).to_string());
    }
    params.insert(GUESTS.to_string(), filter.guest_count().to_string());
    if !filter.amenities().is_empty() {
        let joined = filter
            .amenities()
            .iter()
            .map(Amenity::as_str)
            .collect::<Vec<_>>()
            .join(",");
        params.insert(AMENITIES.to_string(), joined);
    }
    if let Some(price) = filter.price_min() {
        params.insert(PRICE_MIN.to_string(), price.to_string());
    }
    if let Some(price) = filter.price_max() {
        params.insert(PRICE_MAX.to_string(), price.to_string());
    }
    if let Some(instant) = filter.instant_book_only() {
        params.insert(INSTANT_BOOK.to_string(), instant.to_string());
    }
    if let Some(rating) = filter.min_rating() {
        params.insert(MIN_RATING.to_string(), rating.to_string());
    }
    if filter.sort() != SortOrder::default() {
        params.insert(SORT.to_string(), filter.sort().to_string());
    }

    params
}

/// Encodes a filter together with a page number; page 1 is left implicit.
pub fn encode_page(filter: &SearchFilter, page: usize) -> QueryParams {
    let mut params = encode(filter);
    if page > 1 {
        params.insert(PAGE.to_string(), page.to_string());
    }
    params
}

/// Decodes query parameters into a filter, substituting defaults for
/// anything missing or malformed. Unknown keys are ignored.
pub fn decode(params: &QueryParams) -> SearchFilter {
    let check_in = params.get(CHECK_IN).and_then(|v| parse_field(CHECK_IN, v, parse_date));
    let mut check_out = params
        .get(CHECK_OUT)
        .and_then(|v| parse_field(CHECK_OUT, v, parse_date));
    if let (Some(start), Some(end)) = (check_in, check_out) {
        if end < start {
            log::debug!("Dropping {CHECK_OUT}={end}: precedes {CHECK_IN}={start}");
            check_out = None;
        }
    }

    let price_min = params
        .get(PRICE_MIN)
        .and_then(|v| parse_field(PRICE_MIN, v, |s| s.parse::<Price>().ok()));
    let mut price_max = params
        .get(PRICE_MAX)
        .and_then(|v| parse_field(PRICE_MAX, v, |s| s.parse::<Price>().ok()));
    if let (Some(min), Some(max)) = (price_min, price_max) {
        if min.get() > max.get() {
            log::debug!("Dropping {PRICE_MAX}={max}: below {PRICE_MIN}={min}");
            price_max = None;
        }
    }

    let guest_count = params
        .get(GUESTS)
        .and_then(|v| parse_field(GUESTS, v, |s| s.trim().parse::<i64>().ok()))
        .map(GuestCount::clamped)
        .unwrap_or_default();

    let amenities = params
        .get(AMENITIES)
        .map(|v| {
            v.split(',')
                .filter(|part| !part.trim().is_empty())
                .filter_map(|part| Amenity::new(part).ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let instant_book_only = params
        .get(INSTANT_BOOK)
        .and_then(|v| parse_field(INSTANT_BOOK, v, parse_bool));

    let min_rating = params.get(MIN_RATING).and_then(|v| {
        parse_field(MIN_RATING, v, |s| {
            s.trim().parse::<i64>().ok().and_then(|n| Rating::new(n).ok())
        })
    });

    let sort = params
        .get(SORT)
        .and_then(|v| parse_field(SORT, v, |s| s.parse::<SortOrder>().ok()))
        .unwrap_or_default();

    let builder = SearchFilter::builder()
        .location(params.get(LOCATION).map(String::as_str).unwrap_or_default())
        .check_in(check_in)
        .check_out(check_out)
        .guest_count(guest_count)
        .amenities(amenities)
        .price_min(price_min)
        .price_max(price_max)
        .instant_book_only(instant_book_only)
        .min_rating(min_rating)
        .sort(sort);

    // The conflicting values were dropped above, so the invariants hold.
    builder.build().unwrap_or_default()
}

/// Decodes the page number, defaulting to 1.
pub fn decode_page(params: &QueryParams) -> usize {
    params
        .get(PAGE)
        .and_then(|v| parse_field(PAGE, v, |s| s.trim().parse::<usize>().ok()))
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Whether the parameters carry any search intent at all.
///
/// A URL without these keys means "no implicit filter", which is different
/// from a filter with all defaults.
pub fn has_search_params(params: &QueryParams) -> bool {
    FILTER_KEYS.iter().any(|key| params.contains_key(*key))
}

/// Renders parameters as an `application/x-www-form-urlencoded` string.
pub fn to_query_string(params: &QueryParams) -> Result<String, serde_html_form::ser::Error> {
    serde_html_form::to_string(params)
}

/// Parses a query string into parameters. A leading `?` is tolerated and
/// for repeated keys the last value wins. Unparsable input yields no
/// parameters.
pub fn parse_query_string(input: &str) -> QueryParams {
    let trimmed = input.trim().trim_start_matches('?');
    match serde_html_form::from_str::<Vec<(String, String)>>(trimmed) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(err) => {
            log::debug!("Ignoring unparsable query string {trimmed:?}: {err}");
            QueryParams::new()
        }
    }
}

fn parse_field<T>(key: &str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse(raw);
    if parsed.is_none() {
        log::debug!("Defaulting malformed query parameter {key}={raw:?}");
    }
    parsed
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl From<&QueryParams> for SearchFilter {
    fn from(params: &QueryParams) -> Self {
        decode(params)
    }
}

impl Serialize for SearchFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SearchFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let params = QueryParams::deserialize(deserializer)?;
        Ok(decode(&params))
    }
}
