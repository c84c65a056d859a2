#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::thread::JoinHandle;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Helper struct to run shopdesk commands in an isolated temp directory
pub struct ShopdeskTest {
    pub temp_dir: TempDir,
}

impl ShopdeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        ShopdeskTest { temp_dir }
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join(".shopdesk")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_shopdesk"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("SHOPDESK_ROOT", self.root())
            .env("NO_COLOR", "1")
            .env_remove("SHOPDESK_TOKEN")
            .output()
            .expect("Failed to execute shopdesk command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    /// Run with `--json` appended and parse stdout.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut args = args.to_vec();
        args.push("--json");
        let stdout = self.run_success(&args);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{stdout}"))
    }

    /// Point the CLI at `base_url`.
    pub fn connect(&self, base_url: &str) {
        self.run_success(&["config", "set", "api.base_url", base_url]);
    }

    pub fn write_config(&self, yaml: &str) {
        fs::create_dir_all(self.root()).expect("Failed to create config dir");
        fs::write(self.root().join("config.yaml"), yaml).expect("Failed to write config");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.root().join("config.yaml")).expect("Failed to read config")
    }
}

/// Voucher row as the admin API returns it.
pub fn voucher(id: u64) -> Value {
    json!({
        "id": id,
        "code": format!("CODE{id:02}"),
        "status": if id % 2 == 0 { "Inactive" } else { "Active" },
        "createdAt": format!("2024-01-{:02}", (id - 1) % 28 + 1),
    })
}

pub fn vouchers(n: u64) -> Vec<Value> {
    (1..=n).map(voucher).collect()
}

#[derive(Default)]
struct BackendState {
    vouchers: Vec<Value>,
    next_id: u64,
    list_requests: Vec<HashMap<String, String>>,
    fail_deletes: bool,
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process admin API on an ephemeral port.
///
/// Serves `/api/vouchers` in the enveloped shape, `/api/brands` as a bare
/// page without counts, and `/api/broken` as a plain-text 500. A bearer
/// token of `expired` yields 401; `readonly` yields 403 on writes.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeBackend {
    pub fn start() -> Self {
        Self::with_vouchers(vouchers(0))
    }

    pub fn with_vouchers(rows: Vec<Value>) -> Self {
        let next_id = rows.len() as u64 + 1;
        let state = Arc::new(Mutex::new(BackendState {
            vouchers: rows,
            next_id,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/vouchers", get(list_vouchers).post(create_voucher))
            .route("/api/vouchers/:id", put(update_voucher).delete(delete_voucher))
            .route("/api/brands", get(list_brands))
            .route("/api/broken", get(broken))
            .with_state(Arc::clone(&state));

        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build backend runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind backend");
                addr_tx
                    .send(listener.local_addr().expect("backend has no address"))
                    .expect("test dropped before backend started");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("backend failed");
            });
        });

        let addr = addr_rx.recv().expect("backend did not start");
        FakeBackend {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Base URL to configure as `api.base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// `pageNumber` of every voucher list request, in arrival order.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.state
            .lock()
            .list_requests
            .iter()
            .filter_map(|params| params.get("pageNumber")?.parse().ok())
            .collect()
    }

    pub fn list_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().list_requests.clone()
    }

    pub fn voucher_ids(&self) -> Vec<String> {
        self.state.lock().vouchers.iter().map(id_of).collect()
    }

    pub fn voucher(&self, id: &str) -> Option<Value> {
        self.state
            .lock()
            .vouchers
            .iter()
            .find(|v| id_of(v) == id)
            .cloned()
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.state.lock().fail_deletes = fail;
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// An address nothing listens on.
pub fn unused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("no local address");
    drop(listener);
    format!("http://{addr}/api")
}

fn id_of(value: &Value) -> String {
    match &value["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn check_auth(headers: &HeaderMap, write: bool) -> Option<Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some("expired") => Some(failure(StatusCode::UNAUTHORIZED, "Token expired")),
        Some("readonly") if write => Some(failure(StatusCode::FORBIDDEN, "Insufficient role")),
        _ => None,
    }
}

const RESERVED_PARAMS: &[&str] = &[
    "pageNumber",
    "pageSize",
    "keyword",
    "createdAtFrom",
    "createdAtTo",
];

fn matches_params(voucher: &Value, params: &HashMap<String, String>) -> bool {
    let text = |field: &str| voucher[field].as_str().unwrap_or_default().to_string();

    let filters_match = params
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .all(|(key, value)| text(key) == *value);

    let keyword_match = params.get("keyword").is_none_or(|keyword| {
        text("code")
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    });

    let created = text("createdAt");
    let from_match = params
        .get("createdAtFrom")
        .is_none_or(|from| created.as_str() >= from.as_str());
    let to_match = params
        .get("createdAtTo")
        .is_none_or(|to| created.as_str() <= to.as_str());

    filters_match && keyword_match && from_match && to_match
}

fn page_params(params: &HashMap<String, String>) -> (usize, usize) {
    let page = params
        .get("pageNumber")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1usize)
        .max(1);
    let size = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10usize)
        .max(1);
    (page, size)
}

async fn list_vouchers(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = check_auth(&headers, false) {
        return denied;
    }

    let mut state = state.lock();
    state.list_requests.push(params.clone());

    let (page, size) = page_params(&params);
    let matching: Vec<Value> = state
        .vouchers
        .iter()
        .filter(|v| matches_params(v, &params))
        .cloned()
        .collect();
    let total = matching.len();
    let items: Vec<Value> = matching.into_iter().skip((page - 1) * size).take(size).collect();

    Json(json!({
        "success": true,
        "data": {
            "items": items,
            "totalCount": total,
            "pageNumber": page,
            "pageSize": size,
            "totalPages": total.div_ceil(size).max(1),
        }
    }))
    .into_response()
}

async fn create_voucher(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(denied) = check_auth(&headers, true) {
        return denied;
    }

    let code = body["code"].as_str().unwrap_or_default().trim().to_string();
    if code.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Validation failed",
                "errors": { "code": ["Code is required"] }
            })),
        )
            .into_response();
    }

    let mut state = state.lock();
    let id = state.next_id;
    state.next_id += 1;
    body["id"] = json!(id);
    state.vouchers.push(body.clone());

    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": body })),
    )
        .into_response()
}

async fn update_voucher(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(denied) = check_auth(&headers, true) {
        return denied;
    }

    let mut state = state.lock();
    let Some(existing) = state.vouchers.iter_mut().find(|v| id_of(v) == id) else {
        return failure(StatusCode::NOT_FOUND, "Voucher not found");
    };
    body["id"] = existing["id"].clone();
    *existing = body.clone();

    Json(json!({ "success": true, "data": body })).into_response()
}

async fn delete_voucher(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Some(denied) = check_auth(&headers, true) {
        return denied;
    }

    let mut state = state.lock();
    if state.fail_deletes {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let Some(index) = state.vouchers.iter().position(|v| id_of(v) == id) else {
        return failure(StatusCode::NOT_FOUND, "Voucher not found");
    };
    state.vouchers.remove(index);

    StatusCode::NO_CONTENT.into_response()
}

async fn list_brands(Query(params): Query<HashMap<String, String>>) -> Response {
    let brands = [
        json!({ "id": 1, "name": "Cocoon", "origin": "Vietnam" }),
        json!({ "id": 2, "name": "Innisfree", "origin": "Korea" }),
        json!({ "id": 3, "name": "The Ordinary", "origin": "Canada" }),
    ];
    let (page, size) = page_params(&params);
    let items: Vec<Value> = brands.into_iter().skip((page - 1) * size).take(size).collect();
    Json(json!({ "items": items })).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}
