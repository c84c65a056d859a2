//! In-memory store used by the controller tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Result, ShopdeskError};
use crate::list::filter::FieldSource;
use crate::remote::{ListQuery, ListResult, MutationOutcome, MutationRequest, RemoteStore};

#[derive(Debug, Clone, PartialEq)]
pub struct Voucher {
    pub id: String,
    pub code: String,
    pub status: String,
}

impl Voucher {
    pub fn new(id: &str, code: &str, status: &str) -> Self {
        Self {
            id: id.to_string(),
            code: code.to_string(),
            status: status.to_string(),
        }
    }
}

impl FieldSource for Voucher {
    fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "code" => Some(self.code.clone()),
            "status" => Some(self.status.clone()),
            _ => None,
        }
    }
}

/// `count` vouchers with ids `1..=count`, all active.
pub fn vouchers(count: usize) -> Vec<Voucher> {
    (1..=count)
        .map(|i| Voucher::new(&i.to_string(), &format!("CODE{i:02}"), "Active"))
        .collect()
}

/// Backend double paging and filtering like the admin API.
#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<Vec<Voucher>>,
    requests: Mutex<Vec<ListQuery>>,
    mutations: Mutex<Vec<String>>,
    next_id: AtomicU64,
    fail_next_mutation: AtomicBool,
    fail_fetches: AtomicBool,
    hold_first_fetch: AtomicBool,
    gate: Notify,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Voucher>) -> Self {
        let store = Self::default();
        store.next_id.store(rows.len() as u64 + 1, Ordering::SeqCst);
        *store.rows.lock() = rows;
        store
    }

    pub fn fail_next_mutation(&self) {
        self.fail_next_mutation.store(true, Ordering::SeqCst);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Park the next fetch until [`FakeStore::release`] is called.
    pub fn hold_next_fetch(&self) {
        self.hold_first_fetch.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn requests(&self) -> Vec<ListQuery> {
        self.requests.lock().clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().iter().map(|q| q.page).collect()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().clone()
    }

    /// Rows changed behind the controller's back.
    pub fn replace_rows(&self, rows: Vec<Voucher>) {
        *self.rows.lock() = rows;
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    type Item = Voucher;
    type Payload = Voucher;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResult<Voucher>> {
        self.requests.lock().push(query.clone());

        if self.hold_first_fetch.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ShopdeskError::Network("connection refused".to_string()));
        }

        let matching: Vec<Voucher> = self
            .rows
            .lock()
            .iter()
            .filter(|row| {
                query
                    .active_filters()
                    .all(|(key, value)| row.field_text(key).as_deref() == Some(value))
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let start = (query.page as usize - 1) * query.page_size as usize;
        let items = matching
            .into_iter()
            .skip(start)
            .take(query.page_size as usize)
            .collect();
        Ok(ListResult::new(items, total, query.page, query.page_size))
    }

    async fn mutate(&self, request: MutationRequest<Voucher>) -> Result<MutationOutcome<Voucher>> {
        self.mutations.lock().push(request.verb().to_string());

        if self.fail_next_mutation.swap(false, Ordering::SeqCst) {
            return Err(ShopdeskError::Server {
                status: 500,
                message: "database unavailable".to_string(),
            });
        }

        let mut rows = self.rows.lock();
        match request {
            MutationRequest::Create(mut voucher) => {
                voucher.id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
                rows.push(voucher.clone());
                Ok(MutationOutcome::with_entity(voucher))
            }
            MutationRequest::Update(id, voucher) => {
                let row = rows
                    .iter_mut()
                    .find(|row| row.id == id)
                    .ok_or_else(|| not_found(&id))?;
                *row = Voucher { id, ..voucher };
                Ok(MutationOutcome::with_entity(row.clone()))
            }
            MutationRequest::Delete(id) => {
                let index = rows
                    .iter()
                    .position(|row| row.id == id)
                    .ok_or_else(|| not_found(&id))?;
                rows.remove(index);
                Ok(MutationOutcome::empty())
            }
        }
    }
}

fn not_found(id: &str) -> ShopdeskError {
    ShopdeskError::Server {
        status: 404,
        message: format!("voucher {id} not found"),
    }
}
