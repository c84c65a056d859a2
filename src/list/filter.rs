//! In-memory narrowing of list items.
//!
//! Search is a case-insensitive substring match over a set of field
//! matchers: an item is kept when any text yielded by any matcher contains
//! the term. Each text is tested on its own, so a term never matches
//! across two field values.
//! Discrete filters (status, category, date range) are ANDed on top.
//! Everything here is pure and cheap enough to run on every keystroke.

use std::sync::Arc;

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::remote::{DateRange, ListQuery};

/// Extracts the searchable texts of an item. Usually one field value, but
/// catch-all matchers may yield several.
pub type Matcher<T> = Arc<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// Items whose fields can be looked up by name.
pub trait FieldSource {
    /// Text of `field`, or `None` if the item has no such value.
    fn field_text(&self, field: &str) -> Option<String>;
}

/// Matcher over a single text accessor.
pub fn text_matcher<T>(text: impl Fn(&T) -> String + Send + Sync + 'static) -> Matcher<T> {
    Arc::new(move |item: &T| vec![text(item)])
}

/// Matcher reading a named field through [`FieldSource`].
pub fn field_matcher<T: FieldSource>(field: impl Into<String>) -> Matcher<T> {
    let field = field.into();
    Arc::new(move |item: &T| Vec::from_iter(item.field_text(&field)))
}

/// Keep the items matching `search_term` through any of `matchers`.
///
/// Only the empty term keeps everything; whitespace is matched literally.
/// Input order is preserved.
pub fn apply<T: Clone>(items: &[T], search_term: &str, matchers: &[Matcher<T>]) -> Vec<T> {
    if search_term.is_empty() {
        return items.to_vec();
    }
    let needle = search_term.to_lowercase();

    items
        .iter()
        .filter(|&item| matches_search(item, &needle, matchers))
        .cloned()
        .collect()
}

/// `needle` must already be lowercased.
fn matches_search<T>(item: &T, needle: &str, matchers: &[Matcher<T>]) -> bool {
    matchers.iter().any(|matcher| {
        matcher(item)
            .iter()
            .any(|text| text.to_lowercase().contains(needle))
    })
}

/// A discrete filter on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    /// Case-insensitive equality, e.g. `status = Active`
    Equals { field: String, value: String },
    /// Inclusive date bounds; unparseable values never match
    DateRange {
        field: String,
        from: Option<Date>,
        to: Option<Date>,
    },
}

impl FieldFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldFilter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches<T: FieldSource>(&self, item: &T) -> bool {
        match self {
            FieldFilter::Equals { field, value } => item
                .field_text(field)
                .is_some_and(|actual| actual.trim().to_lowercase() == value.trim().to_lowercase()),
            FieldFilter::DateRange { field, from, to } => {
                let Some(date) = item.field_text(field).as_deref().and_then(parse_date) else {
                    return false;
                };
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            }
        }
    }
}

impl From<&DateRange> for FieldFilter {
    fn from(range: &DateRange) -> Self {
        FieldFilter::DateRange {
            field: range.field.clone(),
            from: range.from,
            to: range.to,
        }
    }
}

/// The discrete filters a query asks for.
pub fn filters_for(query: &ListQuery) -> Vec<FieldFilter> {
    let mut filters: Vec<FieldFilter> = query
        .active_filters()
        .map(|(field, value)| FieldFilter::equals(field, value))
        .collect();

    if let Some(range) = query.date_range.as_ref().filter(|r| !r.is_open()) {
        filters.push(FieldFilter::from(range));
    }
    filters
}

/// Keep the items passing every filter.
pub fn apply_filters<T: FieldSource + Clone>(items: &[T], filters: &[FieldFilter]) -> Vec<T> {
    items
        .iter()
        .filter(|item| filters.iter().all(|f| f.matches(*item)))
        .cloned()
        .collect()
}

/// Search and discrete filters of `query` combined with AND.
pub fn narrow<T: FieldSource + Clone>(
    items: &[T],
    query: &ListQuery,
    matchers: &[Matcher<T>],
) -> Vec<T> {
    let searched = apply(items, &query.search_term, matchers);
    apply_filters(&searched, &filters_for(query))
}

/// Read a calendar date from an ISO date, a civil datetime or an RFC 3339
/// timestamp (converted to UTC).
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Some(ts.to_zoned(TimeZone::UTC).date());
    }
    if let Ok(dt) = text.parse::<DateTime>() {
        return Some(dt.date());
    }
    text.parse::<Date>().ok()
}
