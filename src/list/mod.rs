//! Generic list views: fetch, narrow, page, mutate, reconcile.

pub mod controller;
pub mod filter;
pub mod lookup;
pub mod mutation;
pub mod notify;
pub mod pagination;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{FetchApplied, FetchTicket, KeyFn, ListController, SharedController};
pub use filter::{FieldFilter, FieldSource, Matcher, field_matcher, text_matcher};
pub use lookup::LookupTable;
pub use mutation::{DeletePolicy, PayloadValidator, PendingMutation, Reconcile};
pub use notify::{Notification, NotificationKind, NotificationLog, NotificationSink};
pub use pagination::{
    FetchStrategy, PageSlot, PaginationTracker, QueryChange, clamp_page, on_delete_success,
    page_window, total_pages,
};
pub use state::{LoadPhase, ViewState};
