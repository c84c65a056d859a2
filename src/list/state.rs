//! Observable state of one list view.

use crate::error::{ErrorInfo, ShopdeskError};
use crate::remote::{ListQuery, ListResult};

/// Where the view is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What a list screen renders: the visible page, the query that produced
/// it, and the loading and error flags.
///
/// The last good result survives a failed fetch so the table never goes
/// blank on a transient error.
#[derive(Debug, Clone)]
pub struct ViewState<T> {
    phase: LoadPhase,
    result: Option<ListResult<T>>,
    error: Option<ErrorInfo>,
    query: ListQuery,
}

impl<T> ViewState<T> {
    pub fn new(query: ListQuery) -> Self {
        Self {
            phase: LoadPhase::Idle,
            result: None,
            error: None,
            query,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn result(&self) -> Option<&ListResult<T>> {
        self.result.as_ref()
    }

    /// Visible rows; empty before the first successful fetch.
    pub fn items(&self) -> &[T] {
        self.result
            .as_ref()
            .map(|r| r.items.as_slice())
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// The query the user is looking at.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub(crate) fn query_mut(&mut self) -> &mut ListQuery {
        &mut self.query
    }

    pub(crate) fn start_loading(&mut self) {
        self.phase = LoadPhase::Loading;
    }

    /// A fetch landed: show it and clear any earlier error.
    pub(crate) fn loaded(&mut self, result: ListResult<T>) {
        self.result = Some(result);
        self.phase = LoadPhase::Loaded;
        self.error = None;
    }

    /// Replace the visible page without touching phase or error.
    pub(crate) fn show(&mut self, result: ListResult<T>) {
        self.result = Some(result);
    }

    pub(crate) fn fail(&mut self, err: &ShopdeskError) {
        self.phase = LoadPhase::Error;
        self.error = Some(ErrorInfo::from(err));
    }
}
