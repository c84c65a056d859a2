//! The list-management controller.
//!
//! A [`ListController`] owns the [`ViewState`] of one list screen and drives
//! its lifecycle: load, narrow, display, mutate, reconcile. It talks to the
//! backend only through a [`RemoteStore`].
//!
//! Every fetch is tagged with a sequence number when it is issued. When a
//! result comes back, it is applied only if no newer fetch has been issued
//! since; otherwise it is dropped. Callers that interleave fetches (see
//! [`SharedController`]) get last-request-wins without cancellation.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::remote::{
    DateRange, ListQuery, ListResult, MutationOutcome, MutationRequest, RemoteStore,
};

use super::filter::{self, FieldSource, Matcher};
use super::mutation::{DeletePolicy, PayloadValidator};
use super::notify::{self, NotificationSink};
use super::pagination::{FetchStrategy, PaginationTracker, QueryChange, paginate_locally};
use super::state::ViewState;

/// Extracts the backend id of an item.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// A fetch that has been issued but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: ListQuery,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The query to send to the store.
    pub fn request(&self) -> &ListQuery {
        &self.request
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    /// The result is now visible
    Applied,
    /// A newer fetch was issued; the result was dropped
    Stale,
    /// The result is visible but the page shrank below the requested one;
    /// the clamped page must be fetched
    PageClamped,
}

/// Composes the store, the filter engine and the pagination tracker into
/// one list view.
pub struct ListController<S: RemoteStore> {
    pub(super) store: Arc<S>,
    pub(super) state: ViewState<S::Item>,
    pub(super) tracker: PaginationTracker,
    /// Last fetched data: one server page, or the whole client-side batch
    pub(super) raw: Option<ListResult<S::Item>>,
    matchers: Vec<Matcher<S::Item>>,
    pub(super) key_fn: KeyFn<S::Item>,
    pub(super) notifier: Arc<dyn NotificationSink>,
    pub(super) delete_policy: DeletePolicy,
    pub(super) label: String,
    last_seq: u64,
}

impl<S: RemoteStore> fmt::Debug for ListController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("label", &self.label)
            .field("query", self.state.query())
            .field("phase", &self.state.phase())
            .field("strategy", &self.tracker.strategy())
            .field("delete_policy", &self.delete_policy)
            .field("last_seq", &self.last_seq)
            .finish()
    }
}

impl<S> ListController<S>
where
    S: RemoteStore,
    S::Item: FieldSource + Clone + Send + Sync + 'static,
{
    pub fn new(store: impl Into<Arc<S>>, page_size: u32) -> Self {
        Self {
            store: store.into(),
            state: ViewState::new(ListQuery::new(page_size)),
            tracker: PaginationTracker::default(),
            raw: None,
            matchers: Vec::new(),
            key_fn: Arc::new(|item: &S::Item| item.field_text("id")),
            notifier: notify::silent(),
            delete_policy: DeletePolicy::default(),
            label: "item".to_string(),
            last_seq: 0,
        }
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.tracker = PaginationTracker::new(strategy);
        self
    }

    /// Fields the search box matches against.
    pub fn with_matchers(mut self, matchers: Vec<Matcher<S::Item>>) -> Self {
        self.matchers = matchers;
        self
    }

    pub fn with_key(mut self, key_fn: KeyFn<S::Item>) -> Self {
        self.key_fn = key_fn;
        self
    }

    /// Use `field` as the item id.
    pub fn with_id_field(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.with_key(Arc::new(move |item: &S::Item| item.field_text(&field)))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Name used in notifications, e.g. "voucher".
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Start from `query` instead of page 1 with no filters.
    pub fn with_query(mut self, query: ListQuery) -> Self {
        *self.state.query_mut() = query;
        self
    }

    pub fn view(&self) -> &ViewState<S::Item> {
        &self.state
    }

    pub fn query(&self) -> &ListQuery {
        self.state.query()
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.tracker.strategy()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issue a fetch for the current query.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.last_seq += 1;
        self.state.start_loading();

        let request = self.tracker.request_for(self.state.query());
        tracing::debug!(
            "{}: fetch #{} page={} size={}",
            self.label,
            self.last_seq,
            request.page,
            request.page_size
        );

        FetchTicket {
            seq: self.last_seq,
            request,
        }
    }

    /// Whether `ticket` is the most recently issued fetch.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.last_seq
    }

    /// Apply the outcome of the fetch identified by `ticket`.
    ///
    /// Stale outcomes, successful or not, are dropped without touching the
    /// view. A failure of the current fetch is recorded in the view and
    /// returned; the previous result stays visible.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<ListResult<S::Item>>,
    ) -> Result<FetchApplied> {
        if !self.is_current(&ticket) {
            tracing::debug!(
                "{}: dropping stale fetch #{} (latest is #{})",
                self.label,
                ticket.seq,
                self.last_seq
            );
            return Ok(FetchApplied::Stale);
        }

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("{}: fetch #{} failed: {err}", self.label, ticket.seq);
                self.state.fail(&err);
                return Err(err);
            }
        };

        let server_paged = !self.tracker.is_client_side();
        let total_pages = result.total_pages;
        self.raw = Some(result);
        let projected = self.project();
        self.state.loaded(projected);

        if server_paged && self.state.query_mut().clamp_to(total_pages) {
            tracing::debug!(
                "{}: page out of range, moving to page {}",
                self.label,
                self.state.query().page
            );
            return Ok(FetchApplied::PageClamped);
        }
        Ok(FetchApplied::Applied)
    }

    /// Change the query. Returns a ticket when the change needs the network;
    /// otherwise the view is re-narrowed in place.
    pub fn change_query(
        &mut self,
        change: QueryChange,
        edit: impl FnOnce(&mut ListQuery),
    ) -> Option<FetchTicket> {
        {
            let query = self.state.query_mut();
            edit(query);
            query.page = query.page.max(1);
            query.page_size = query.page_size.max(1);
        }
        if self.tracker.resets_page(change) {
            self.state.query_mut().page = 1;
        }

        if self.tracker.needs_fetch(change, self.raw.is_some()) {
            Some(self.begin_fetch())
        } else {
            self.refresh_view();
            None
        }
    }

    /// Recompute the visible page from the last fetched data.
    pub(super) fn refresh_view(&mut self) {
        if self.raw.is_some() {
            let projected = self.project();
            self.state.show(projected);
        }
    }

    /// Visible page for the current query.
    fn project(&mut self) -> ListResult<S::Item> {
        let query = self.state.query().clone();
        let Some(raw) = &self.raw else {
            return ListResult::empty(query.page_size);
        };

        match self.tracker.strategy() {
            FetchStrategy::ServerPaged { server_search } => {
                // Filters and paging already happened on the server.
                let items = if server_search {
                    raw.items.clone()
                } else {
                    filter::apply(&raw.items, &query.search_term, &self.matchers)
                };
                ListResult {
                    items,
                    total_count: raw.total_count,
                    page_number: raw.page_number,
                    page_size: raw.page_size,
                    total_pages: raw.total_pages,
                }
            }
            FetchStrategy::ClientSide { .. } => {
                let narrowed = filter::narrow(&raw.items, &query, &self.matchers);
                let page = paginate_locally(narrowed, query.page, query.page_size);
                self.state.query_mut().page = page.page_number;
                page
            }
        }
    }

    /// Run `ticket` to completion, following one page clamp if needed.
    pub(super) async fn run(&mut self, ticket: FetchTicket) -> Result<()> {
        let mut ticket = ticket;
        let mut clamped = false;
        loop {
            let outcome = self.store.fetch_page(ticket.request()).await;
            match self.complete_fetch(ticket, outcome)? {
                FetchApplied::PageClamped if !clamped => {
                    clamped = true;
                    ticket = self.begin_fetch();
                }
                _ => return Ok(()),
            }
        }
    }

    async fn change_and_run(
        &mut self,
        change: QueryChange,
        edit: impl FnOnce(&mut ListQuery),
    ) -> Result<()> {
        match self.change_query(change, edit) {
            Some(ticket) => self.run(ticket).await,
            None => Ok(()),
        }
    }

    /// Initial load.
    pub async fn load(&mut self) -> Result<()> {
        self.refresh().await
    }

    /// Fetch the current query again.
    pub async fn refresh(&mut self) -> Result<()> {
        self.change_and_run(QueryChange::Refresh, |_| {}).await
    }

    pub async fn set_page(&mut self, page: u32) -> Result<()> {
        self.change_and_run(QueryChange::Page, |q| q.page = page).await
    }

    pub async fn set_page_size(&mut self, page_size: u32) -> Result<()> {
        self.change_and_run(QueryChange::PageSize, |q| q.page_size = page_size).await
    }

    pub async fn set_search(&mut self, term: impl Into<String>) -> Result<()> {
        let term = term.into();
        self.change_and_run(QueryChange::Search, |q| q.search_term = term).await
    }

    /// Set or clear (`None`) a discrete filter.
    pub async fn set_filter(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Result<()> {
        let key = key.into();
        self.change_and_run(QueryChange::Filter, |q| {
            q.filters.insert(key, value);
        })
        .await
    }

    pub async fn set_date_range(&mut self, range: Option<DateRange>) -> Result<()> {
        self.change_and_run(QueryChange::Filter, |q| q.date_range = range).await
    }

    /// Submit a mutation and reconcile the view with the backend.
    pub async fn submit(
        &mut self,
        request: MutationRequest<S::Payload>,
    ) -> Result<MutationOutcome<S::Item>> {
        let pending = self.begin_mutation(&request);
        let result = self.store.mutate(request).await;
        let reconcile = self.finish_mutation(pending, result);

        if let Some(ticket) = reconcile.refetch
            && let Err(err) = self.run(ticket).await
        {
            tracing::warn!("{}: refetch after mutation failed: {err}", self.label);
        }
        reconcile.outcome
    }

    /// Validate the payload first; a rejected payload never reaches the store.
    pub async fn submit_validated(
        &mut self,
        request: MutationRequest<S::Payload>,
        validator: &(dyn PayloadValidator<S::Payload> + Sync),
    ) -> Result<MutationOutcome<S::Item>> {
        self.validate(&request, validator)?;
        self.submit(request).await
    }
}

/// A controller shared between tasks, e.g. a UI firing a new search while
/// the previous one is still in flight.
///
/// The lock is held only between awaits, never across one, so overlapping
/// fetches resolve in any order and the sequence check keeps the newest.
pub struct SharedController<S: RemoteStore> {
    inner: Arc<Mutex<ListController<S>>>,
    store: Arc<S>,
}

impl<S: RemoteStore> Clone for SharedController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> SharedController<S>
where
    S: RemoteStore,
    S::Item: FieldSource + Clone + Send + Sync + 'static,
{
    pub fn new(controller: ListController<S>) -> Self {
        let store = Arc::clone(&controller.store);
        Self {
            inner: Arc::new(Mutex::new(controller)),
            store,
        }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ViewState<S::Item> {
        self.inner.lock().state.clone()
    }

    /// Run a closure against the controller without awaiting.
    pub fn with<R>(&self, f: impl FnOnce(&mut ListController<S>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub async fn change(
        &self,
        change: QueryChange,
        edit: impl FnOnce(&mut ListQuery),
    ) -> Result<()> {
        let ticket = self.inner.lock().change_query(change, edit);
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => Ok(()),
        }
    }

    async fn run(&self, ticket: FetchTicket) -> Result<()> {
        let mut ticket = ticket;
        let mut clamped = false;
        loop {
            let outcome = self.store.fetch_page(ticket.request()).await;
            let applied = self.inner.lock().complete_fetch(ticket, outcome)?;
            match applied {
                FetchApplied::PageClamped if !clamped => {
                    clamped = true;
                    ticket = self.inner.lock().begin_fetch();
                }
                _ => return Ok(()),
            }
        }
    }

    pub async fn refresh(&self) -> Result<()> {
        self.change(QueryChange::Refresh, |_| {}).await
    }

    pub async fn set_page(&self, page: u32) -> Result<()> {
        self.change(QueryChange::Page, |q| q.page = page).await
    }

    pub async fn set_search(&self, term: impl Into<String>) -> Result<()> {
        let term = term.into();
        self.change(QueryChange::Search, |q| q.search_term = term).await
    }

    pub async fn set_filter(&self, key: impl Into<String>, value: Option<String>) -> Result<()> {
        let key = key.into();
        self.change(QueryChange::Filter, |q| {
            q.filters.insert(key, value);
        })
        .await
    }

    pub async fn submit(
        &self,
        request: MutationRequest<S::Payload>,
    ) -> Result<MutationOutcome<S::Item>> {
        let pending = self.inner.lock().begin_mutation(&request);
        let result = self.store.mutate(request).await;
        let reconcile = self.inner.lock().finish_mutation(pending, result);

        if let Some(ticket) = reconcile.refetch
            && let Err(err) = self.run(ticket).await
        {
            tracing::warn!("refetch after mutation failed: {err}");
        }
        reconcile.outcome
    }
}
