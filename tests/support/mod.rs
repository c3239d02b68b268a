//! In-process stand-ins for the external services: a minimal PostgREST
//! lookalike backed by in-memory tables, and a webhook receiver that records
//! every payload it is sent.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use helpy::config::Config;

/// Canned completion text served by the fake `/v1/chat/completions` route.
pub const CANNED_COMPLETION: &str = "Our couriers deliver every day between 9am and 6pm.";

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    pub webhooks: Arc<Mutex<Vec<Value>>>,
    pub completions: Arc<Mutex<Vec<Value>>>,
}

impl FakeBackend {
    pub fn table(&self, name: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, name: &str, rows: Vec<Value>) {
        self.tables.lock().unwrap().insert(name.to_string(), rows);
    }

    pub fn webhook_payloads(&self) -> Vec<Value> {
        self.webhooks.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<Value> {
        self.completions.lock().unwrap().clone()
    }
}

fn row_matches(row: &Value, params: &HashMap<String, String>) -> bool {
    params.iter().all(|(column, value)| {
        if matches!(column.as_str(), "select" | "order" | "on_conflict") {
            return true;
        }
        let Some(wanted) = value.strip_prefix("eq.") else {
            return true;
        };
        match &row[column.as_str()] {
            Value::String(s) => s == wanted,
            other => other.to_string() == wanted,
        }
    })
}

async fn select_rows(
    State(state): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let tables = state.tables.lock().unwrap();
    let mut rows: Vec<Value> = tables
        .get(&table)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|row| row_matches(row, &params))
        .collect();

    if let Some(order) = params.get("order") {
        let column = order.trim_end_matches(".asc").to_string();
        rows.sort_by_key(|row| row[column.as_str()].to_string());
    }
    Json(rows)
}

async fn insert_rows(
    State(state): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Vec<Value>>) {
    let incoming = match body {
        Value::Array(rows) => rows,
        single => vec![single],
    };

    let merge_duplicates = headers
        .get("Prefer")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("resolution=merge-duplicates"))
        .unwrap_or(false);
    let conflict_column = params.get("on_conflict").filter(|_| merge_duplicates);

    let mut tables = state.tables.lock().unwrap();
    let rows = tables.entry(table).or_default();

    let mut inserted = Vec::new();
    for mut row in incoming {
        if row["id"].is_null() {
            row["id"] = Value::String(Uuid::new_v4().to_string());
        }
        if let Some(column) = conflict_column {
            rows.retain(|existing| existing[column.as_str()] != row[column.as_str()]);
        }
        rows.push(row.clone());
        inserted.push(row);
    }
    (StatusCode::CREATED, Json(inserted))
}

async fn update_rows(
    State(state): State<FakeBackend>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(patch): Json<Value>,
) -> Json<Vec<Value>> {
    let mut tables = state.tables.lock().unwrap();
    let rows = tables.entry(table).or_default();

    let mut updated = Vec::new();
    for row in rows.iter_mut() {
        if row_matches(row, &params) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
    }
    Json(updated)
}

async fn complete_chat(
    State(state): State<FakeBackend>,
    Json(request): Json<Value>,
) -> Json<Value> {
    state.completions.lock().unwrap().push(request);
    Json(serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 0,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": CANNED_COMPLETION },
            "finish_reason": "stop",
            "logprobs": null,
        }],
    }))
}

async fn receive_webhook(
    State(state): State<FakeBackend>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    state.webhooks.lock().unwrap().push(payload);
    Json(serde_json::json!({ "ok": true }))
}

/// Binds the fake backend on a loopback port and returns its base URL.
pub async fn spawn(state: FakeBackend) -> String {
    let router = Router::new()
        .route(
            "/rest/v1/:table",
            get(select_rows).post(insert_rows).patch(update_rows),
        )
        .route("/hook", post(receive_webhook))
        .route("/v1/chat/completions", post(complete_chat))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test listener");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .expect("failed to start test server")
            .serve(router.into_make_service())
            .await
            .expect("test server exited");
    });

    format!("http://{}", addr)
}

/// Config pointing every adapter at the fake backend.
pub fn test_config(base_url: &str) -> Config {
    Config {
        supabase_url: base_url.to_string(),
        supabase_key: "test-service-role-key".to_string(),
        openai_api_key: Some("test-openai-key".to_string()),
        openai_api_base: Some(format!("{}/v1", base_url)),
        openai_model: "gpt-4o".to_string(),
        mapbox_token: None,
        zapier_webhook: Some(format!("{}/hook", base_url)),
        stripe_secret: None,
        api_keys: Vec::new(),
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}
