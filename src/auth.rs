use axum::{extract::State, http::Request, middleware::Next, response::Response};

use crate::api::AppState;
use crate::error::{AppError, AppResult};

/// Routes reachable without a key: the health check, and the payment
/// webhook (Stripe authenticates with its own signature header).
const OPEN_PATHS: &[&str] = &["/", "/webhook/stripe"];

/// `x-api-key` middleware. Enforced only when `API_KEYS` is configured;
/// with no keys the surface stays open.
pub async fn require_api_key<B>(
    State(state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> AppResult<Response> {
    if state.api_keys.is_empty() || OPEN_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(key) if state.api_keys.iter().any(|k| k == key) => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized),
    }
}
