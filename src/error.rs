use async_openai::error::OpenAIError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Transport-level failure talking to the data store or a webhook.
    HttpError(reqwest::Error),
    /// The data store answered with a non-success status.
    StoreRejected(String),
    /// The escalation webhook answered with a non-success status.
    WebhookFailed(String),
    JsonError(serde_json::Error),
    OpenAIError(OpenAIError),
    NotFound(String),
    InvalidInput(String),
    MissingConfig(String),
    Unauthorized,
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<OpenAIError> for AppError {
    fn from(err: OpenAIError) -> Self {
        AppError::OpenAIError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::HttpError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::StoreRejected(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::WebhookFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::OpenAIError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MissingConfig(name) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} is not configured", name),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid api key".to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
