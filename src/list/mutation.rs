//! Create, update and delete against a list view.
//!
//! Every write goes through [`ListController::submit`]. Deletes are applied
//! to the visible data before the request is sent; any failure is rolled
//! back by fetching the page the user was on again, so the view never keeps
//! a patch the backend refused.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopdeskError};
use crate::remote::{MutationKind, MutationOutcome, MutationRequest, RemoteStore};

use super::controller::{FetchTicket, ListController};
use super::filter::FieldSource;
use super::notify::Notification;
use super::pagination::on_delete_success;

/// What to do after a delete succeeded without moving to another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Fetch the page again from the backend
    #[default]
    Refetch,
    /// Keep the locally patched page
    TrustLocal,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Refetch => write!(f, "refetch"),
            DeletePolicy::TrustLocal => write!(f, "trust_local"),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = ShopdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "refetch" => Ok(DeletePolicy::Refetch),
            "trust_local" => Ok(DeletePolicy::TrustLocal),
            _ => Err(ShopdeskError::Config(format!(
                "unknown delete policy '{s}', expected 'refetch' or 'trust_local'"
            ))),
        }
    }
}

/// Checks a payload before it is sent. Entity rules live with the caller.
pub trait PayloadValidator<P> {
    fn validate(&self, payload: &P) -> Result<()>;
}

impl<P, F> PayloadValidator<P> for F
where
    F: Fn(&P) -> Result<()>,
{
    fn validate(&self, payload: &P) -> Result<()> {
        self(payload)
    }
}

/// A mutation that has been sent but not reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    kind: MutationKind,
    target_id: Option<String>,
    /// Page shown before any optimistic patch, restored on rollback
    page: u32,
    /// Whether a row was removed from the view ahead of the response
    optimistic: bool,
}

impl PendingMutation {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn verb(&self) -> &'static str {
        self.kind.verb()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }
}

/// Result of reconciling a mutation with the view.
#[derive(Debug)]
pub struct Reconcile<T> {
    /// What the caller of `submit` gets back
    pub outcome: Result<MutationOutcome<T>>,
    /// Fetch to run so the view matches the backend
    pub refetch: Option<FetchTicket>,
}

impl<S> ListController<S>
where
    S: RemoteStore,
    S::Item: FieldSource + Clone + Send + Sync + 'static,
{
    /// Run `validator` over the request payload. A rejection is reported as
    /// a validation error and nothing is sent.
    pub fn validate(
        &self,
        request: &MutationRequest<S::Payload>,
        validator: &(dyn PayloadValidator<S::Payload> + Sync),
    ) -> Result<()> {
        let Some(payload) = request.payload() else {
            return Ok(());
        };

        validator.validate(payload).map_err(|err| {
            let err = match err {
                ShopdeskError::Validation(_) => err,
                other => ShopdeskError::Validation(other.to_string()),
            };
            self.notifier.notify(Notification::error(err.to_string()));
            err
        })
    }

    /// Record a mutation about to be sent; deletes are applied to the view
    /// right away.
    pub fn begin_mutation(&mut self, request: &MutationRequest<S::Payload>) -> PendingMutation {
        let target_id = request.target_id().map(str::to_string);
        let page = self.state.query().page;
        tracing::info!(
            "{}: {} {}",
            self.label,
            request.verb(),
            target_id.as_deref().unwrap_or("(new)")
        );

        let optimistic = match request {
            MutationRequest::Delete(id) => {
                let removed = self.remove_local(id);
                if removed {
                    self.refresh_view();
                }
                removed
            }
            _ => false,
        };

        PendingMutation {
            kind: request.kind(),
            target_id,
            page,
            optimistic,
        }
    }

    /// Drop the row with backend id `id` from the fetched data.
    fn remove_local(&mut self, id: &str) -> bool {
        let key_fn = Arc::clone(&self.key_fn);
        self.raw
            .as_mut()
            .and_then(|raw| raw.remove_where(|item| key_fn(item).as_deref() == Some(id)))
            .is_some()
    }

    /// Reconcile the view with the backend's answer and notify the user.
    pub fn finish_mutation(
        &mut self,
        pending: PendingMutation,
        result: Result<MutationOutcome<S::Item>>,
    ) -> Reconcile<S::Item> {
        let subject = match pending.target_id() {
            Some(id) => format!("{} {id}", self.label),
            None => self.label.clone(),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    "{}: {} failed, refetching page {} to roll back: {err}",
                    self.label,
                    pending.verb(),
                    pending.page
                );
                self.notifier.notify(Notification::error(format!(
                    "Failed to {} {subject}: {err}",
                    pending.verb()
                )));
                // A client-side reslice may have clamped the page.
                if pending.optimistic {
                    self.state.query_mut().page = pending.page;
                }
                return Reconcile {
                    outcome: Err(err),
                    refetch: Some(self.begin_fetch()),
                };
            }
        };

        self.notifier.notify(Notification::success(format!(
            "{} {subject}",
            pending.kind.past_tense()
        )));

        let refetch = match pending.kind {
            MutationKind::Delete => self.reconcile_delete(&pending),
            MutationKind::Create | MutationKind::Update => Some(self.begin_fetch()),
        };
        Reconcile {
            outcome: Ok(outcome),
            refetch,
        }
    }

    fn reconcile_delete(&mut self, pending: &PendingMutation) -> Option<FetchTicket> {
        // A fetch may have landed while the request was in flight.
        if let Some(id) = pending.target_id()
            && self.remove_local(id)
        {
            self.refresh_view();
        }

        let current = self.state.query().page;
        let remaining = if self.tracker.is_client_side() {
            self.state.items().len()
        } else {
            self.raw.as_ref().map_or(0, |raw| raw.items.len())
        };

        let next = on_delete_success(current, remaining);
        if next != current {
            tracing::info!("{}: page {current} is empty, moving to page {next}", self.label);
            self.state.query_mut().page = next;
            return Some(self.begin_fetch());
        }

        match self.delete_policy {
            DeletePolicy::TrustLocal if pending.optimistic => None,
            _ => Some(self.begin_fetch()),
        }
    }
}
