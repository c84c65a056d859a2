//! Backend access for list views.
//!
//! This module defines the query and result types exchanged with the admin
//! REST API and the [`RemoteStore`] trait the list controller talks to.
//! The HTTP implementation lives in [`http`]; wire envelopes are decoded in
//! [`envelope`] and never leak past this module.

pub mod envelope;
pub mod error;
pub mod http;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::list::pagination::{clamp_page, total_pages};

pub use http::HttpStore;

/// Inclusive date bounds applied to one date-valued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub field: String,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    pub fn new(field: impl Into<String>, from: Option<Date>, to: Option<Date>) -> Self {
        Self {
            field: field.into(),
            from,
            to,
        }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Discrete field filters; `None` means the filter is switched off
    pub filters: BTreeMap<String, Option<String>>,
    pub search_term: String,
    pub date_range: Option<DateRange>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filters: BTreeMap::new(),
            search_term: String::new(),
            date_range: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), Some(value.into()));
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Filters that are switched on and carry a non-blank value.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key.as_str(), v))
        })
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filters().next().is_some()
            || self.date_range.as_ref().is_some_and(|r| !r.is_open())
    }

    /// Pull `page` back into `[1, total_pages]`. Returns true if it moved.
    pub fn clamp_to(&mut self, total_pages: u32) -> bool {
        let clamped = clamp_page(self.page, total_pages);
        let moved = clamped != self.page;
        self.page = clamped;
        moved
    }
}

/// One page of records as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> ListResult<T> {
    /// Build a result, deriving `total_pages` from the count and page size.
    pub fn new(items: Vec<T>, total_count: u64, page_number: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            items,
            total_count,
            page_number: page_number.max(1),
            page_size,
            total_pages: total_pages(total_count, page_size),
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), 0, 1, page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the first item matching `pred`, keeping count and pages consistent.
    pub(crate) fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(pred)?;
        let removed = self.items.remove(index);
        self.total_count = self.total_count.saturating_sub(1);
        self.total_pages = total_pages(self.total_count, self.page_size);
        Some(removed)
    }
}

/// Kind of write, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn verb(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }

    /// Capitalized past tense for user-facing messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            MutationKind::Create => "Created",
            MutationKind::Update => "Updated",
            MutationKind::Delete => "Deleted",
        }
    }
}

/// A write against one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRequest<P> {
    Create(P),
    Update(String, P),
    Delete(String),
}

impl<P> MutationRequest<P> {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationRequest::Create(_) => MutationKind::Create,
            MutationRequest::Update(..) => MutationKind::Update,
            MutationRequest::Delete(_) => MutationKind::Delete,
        }
    }

    pub fn verb(&self) -> &'static str {
        self.kind().verb()
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            MutationRequest::Create(_) => None,
            MutationRequest::Update(id, _) | MutationRequest::Delete(id) => Some(id),
        }
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            MutationRequest::Create(payload) | MutationRequest::Update(_, payload) => {
                Some(payload)
            }
            MutationRequest::Delete(_) => None,
        }
    }
}

/// Successful write; the backend may echo the stored entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub entity: Option<T>,
}

impl<T> MutationOutcome<T> {
    pub fn empty() -> Self {
        Self { entity: None }
    }

    pub fn with_entity(entity: T) -> Self {
        Self {
            entity: Some(entity),
        }
    }
}

/// Data source behind a list view.
///
/// Implementations perform the network call and nothing else: they never see
/// or modify view state.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    type Item: Send + Sync;
    type Payload: Send + Sync;

    /// Fetch one page matching `query`.
    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResult<Self::Item>>;

    /// Apply a create, update or delete.
    async fn mutate(
        &self,
        request: MutationRequest<Self::Payload>,
    ) -> Result<MutationOutcome<Self::Item>>;
}

#[async_trait]
impl<S> RemoteStore for Arc<S>
where
    S: RemoteStore + ?Sized,
{
    type Item = S::Item;
    type Payload = S::Payload;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResult<Self::Item>> {
        (**self).fetch_page(query).await
    }

    async fn mutate(
        &self,
        request: MutationRequest<Self::Payload>,
    ) -> Result<MutationOutcome<Self::Item>> {
        (**self).mutate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_result_derives_total_pages() {
        let result: ListResult<u32> = ListResult::new(vec![1; 10], 21, 1, 10);
        assert_eq!(result.total_pages, 3);

        let empty: ListResult<u32> = ListResult::empty(10);
        assert_eq!(empty.total_pages, 1);
        assert_eq!(empty.total_count, 0);
    }

    #[test]
    fn test_list_result_remove_where_updates_counts() {
        let mut result = ListResult::new(vec![1, 2, 3], 21, 3, 10);
        let removed = result.remove_where(|v| *v == 2);
        assert_eq!(removed, Some(2));
        assert_eq!(result.items, vec![1, 3]);
        assert_eq!(result.total_count, 20);
        assert_eq!(result.total_pages, 2);

        assert_eq!(result.remove_where(|v| *v == 42), None);
        assert_eq!(result.total_count, 20);
    }

    #[test]
    fn test_active_filters_skip_null_and_blank() {
        let mut query = ListQuery::new(10).filter("status", "Active");
        query.filters.insert("category".to_string(), None);
        query.filters.insert("brand".to_string(), Some("  ".to_string()));

        let active: Vec<_> = query.active_filters().collect();
        assert_eq!(active, vec![("status", "Active")]);
        assert!(query.has_active_filters());
    }

    #[test]
    fn test_open_date_range_is_not_an_active_filter() {
        let query = ListQuery::new(10).date_range(DateRange::new("createdAt", None, None));
        assert!(!query.has_active_filters());
    }

    #[test]
    fn test_clamp_to_reports_movement() {
        let mut query = ListQuery::new(10).page(5);
        assert!(query.clamp_to(3));
        assert_eq!(query.page, 3);
        assert!(!query.clamp_to(3));

        assert!(query.clamp_to(0));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_page_size_never_zero() {
        assert_eq!(ListQuery::new(0).page_size, 1);
        assert_eq!(ListQuery::new(0).page(0).page, 1);
    }

    #[test]
    fn test_mutation_request_accessors() {
        let create: MutationRequest<&str> = MutationRequest::Create("body");
        assert_eq!(create.kind(), MutationKind::Create);
        assert_eq!(create.verb(), "create");
        assert_eq!(create.target_id(), None);
        assert_eq!(create.payload(), Some(&"body"));

        let delete: MutationRequest<&str> = MutationRequest::Delete("7".to_string());
        assert_eq!(delete.kind(), MutationKind::Delete);
        assert_eq!(delete.target_id(), Some("7"));
        assert_eq!(delete.payload(), None);

        let update: MutationRequest<&str> = MutationRequest::Update("7".to_string(), "body");
        assert_eq!(update.kind().past_tense(), "Updated");
        assert_eq!(update.target_id(), Some("7"));
    }
}
