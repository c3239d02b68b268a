use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::chat::{self, SupportAssistant};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::notify::Notifier;
use crate::store::SupabaseStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub shop_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub shop_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub order_id: Option<String>,
    pub sender: Option<String>,
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub order_id: Option<String>,
    pub issue: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeliveryBoyRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignOrderRequest {
    pub order_id: Option<String>,
    pub delivery_boy_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub key: Option<String>,
    pub value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub order_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: SupabaseStore,
    pub assistant: SupportAssistant,
    pub notifier: Notifier,
    pub api_keys: Vec<String>,
}

pub fn create_router(config: &Config) -> Router {
    let state = AppState {
        store: SupabaseStore::new(config),
        assistant: SupportAssistant::new(config),
        notifier: Notifier::new(config),
        api_keys: config.api_keys.clone(),
    };

    Router::new()
        .route("/", get(home))
        .route("/users", post(create_user).get(list_users))
        .route("/products", post(create_product).get(list_products))
        .route("/orders", post(create_order))
        .route("/orders/:tracking_id", get(get_order_by_tracking))
        .route("/orders/id/:order_id/status", put(update_order_status))
        .route("/messages", post(create_message).get(list_messages))
        .route("/messages/order/:order_id", get(messages_for_order))
        .route("/tickets", post(create_ticket).get(list_tickets))
        .route(
            "/delivery_boys",
            post(create_delivery_boy).get(list_delivery_boys),
        )
        .route("/assign_order", post(assign_order))
        .route("/assignments/order/:order_id", get(assignments_for_order))
        .route("/admin/settings", get(get_settings).post(set_setting))
        .route("/webhook/stripe", post(stripe_webhook))
        .route("/chat", post(chat_message))
        .route("/escalate", post(escalate))
        .route("/analytics", get(analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn require<T>(field: Option<T>, name: &str) -> AppResult<T> {
    field.ok_or_else(|| AppError::InvalidInput(format!("{} required", name)))
}

/// 12-character customer-facing token, distinct from the row's primary key.
pub fn generate_tracking_id() -> String {
    Uuid::new_v4().to_string()[..12].to_string()
}

async fn home() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Helpy API running" }))
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    if request.email.is_none() || request.name.is_none() {
        return Err(AppError::InvalidInput("name and email required".to_string()));
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("users", &record).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.select("users", &[], None).await?))
}

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    if request.shop_id.is_none() || request.name.is_none() || request.price.is_none() {
        return Err(AppError::InvalidInput(
            "shop_id, name and price required".to_string(),
        ));
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("products", &record).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<Value>>> {
    let rows = match &query.shop_id {
        Some(shop_id) => {
            state
                .store
                .select("products", &[("shop_id", shop_id)], None)
                .await?
        }
        None => state.store.select("products", &[], None).await?,
    };
    Ok(Json(rows))
}

async fn create_order(
    State(state): State<AppState>,
    Json(mut request): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    require(request.customer_id.as_ref(), "customer_id")?;
    require(request.total_amount.as_ref(), "total_amount")?;
    if request.tracking_id.is_none() {
        request.tracking_id = Some(generate_tracking_id());
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("orders", &record).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn get_order_by_tracking(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> AppResult<Json<Value>> {
    let order = state
        .store
        .select_single("orders", &[("tracking_id", &tracking_id)])
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;
    Ok(Json(order))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<Vec<Value>>> {
    let status = require(request.status, "status")?;
    let rows = state
        .store
        .update("orders", &[("id", &order_id)], &json!({ "status": status }))
        .await?;
    Ok(Json(rows))
}

async fn create_message(
    State(state): State<AppState>,
    Json(request): Json<CreateMessageRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    if request.order_id.is_none() || request.sender.is_none() || request.content.is_none() {
        return Err(AppError::InvalidInput(
            "order_id, sender and content required".to_string(),
        ));
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("messages", &record).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_messages(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.select("messages", &[], None).await?))
}

async fn messages_for_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<Value>>> {
    let rows = state
        .store
        .select("messages", &[("order_id", &order_id)], Some("created_at"))
        .await?;
    Ok(Json(rows))
}

async fn create_ticket(
    State(state): State<AppState>,
    Json(request): Json<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    if request.order_id.is_none() || request.issue.is_none() {
        return Err(AppError::InvalidInput(
            "order_id and issue required".to_string(),
        ));
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("tickets", &record).await?;

    // Best-effort: the ticket is already stored, a dead webhook must not
    // fail the request.
    state
        .notifier
        .ticket_created(&Value::Array(rows.clone()))
        .await;

    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_tickets(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.select("tickets", &[], None).await?))
}

async fn create_delivery_boy(
    State(state): State<AppState>,
    Json(request): Json<CreateDeliveryBoyRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    if request.name.is_none() || request.phone.is_none() {
        return Err(AppError::InvalidInput("name and phone required".to_string()));
    }
    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("delivery_boys", &record).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

async fn list_delivery_boys(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.select("delivery_boys", &[], None).await?))
}

async fn assign_order(
    State(state): State<AppState>,
    Json(request): Json<AssignOrderRequest>,
) -> AppResult<(StatusCode, Json<Vec<Value>>)> {
    require(request.order_id.as_ref(), "order_id")?;
    let delivery_boy_id = require(request.delivery_boy_id.clone(), "delivery_boy_id")?;

    let record = serde_json::to_value(&request)?;
    let rows = state.store.insert("order_assignments", &record).await?;

    // Second store call, not transactional with the insert. A failure here
    // surfaces as 500 so the caller can see the assignment may be
    // half-applied.
    state
        .store
        .update(
            "delivery_boys",
            &[("id", &delivery_boy_id)],
            &json!({ "status": "busy" }),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(rows)))
}

async fn assignments_for_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<Value>>> {
    let rows = state
        .store
        .select("order_assignments", &[("order_id", &order_id)], None)
        .await?;
    Ok(Json(rows))
}

async fn get_settings(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let rows = state.store.select("settings", &[], None).await?;
    let mut settings = Map::new();
    for row in rows {
        if let Some(key) = row["key"].as_str() {
            settings.insert(key.to_string(), row["value"].clone());
        }
    }
    Ok(Json(Value::Object(settings)))
}

async fn set_setting(
    State(state): State<AppState>,
    Json(request): Json<SetSettingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let key = require(request.key, "key")?;
    let record = json!({
        "key": key,
        "value": request.value.unwrap_or(Value::Null),
    });
    let mut rows = state.store.upsert("settings", &record, "key").await?;
    if rows.is_empty() {
        return Err(AppError::StoreRejected(
            "settings upsert returned no row".to_string(),
        ));
    }
    Ok((StatusCode::CREATED, Json(rows.remove(0))))
}

async fn stripe_webhook(Json(_payload): Json<Value>) -> Json<Value> {
    // TODO: verify the Stripe-Signature header against STRIPE_SECRET before
    // trusting the event.
    info!("stripe webhook event received");
    Json(json!({ "received": true }))
}

async fn chat_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    let message = require(request.message, "message")?;
    let reply = chat::handle_chat_message(&state.store, &state.assistant, &message).await?;
    Ok(Json(json!({ "reply": reply })))
}

async fn escalate(
    State(state): State<AppState>,
    Json(request): Json<EscalateRequest>,
) -> AppResult<Json<Value>> {
    let order_id = require(request.order_id, "order_id")?;
    let payload = json!({
        "escalation": {
            "order_id": order_id.clone(),
            "reason": request.reason.unwrap_or_default(),
        }
    });
    state.notifier.escalate(&payload).await?;
    Ok(Json(json!({ "status": "escalated", "order_id": order_id })))
}

async fn analytics() -> Json<Value> {
    // Placeholder numbers until reporting moves to real store queries.
    Json(json!({
        "total_orders": 128,
        "delivered_today": 17,
        "open_tickets": 4,
        "average_delivery_minutes": 42,
    }))
}
