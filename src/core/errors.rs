use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

pub const NOT_READY_MESSAGE: &str = "QA system initialization failed. Try restarting the server.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("qa pipeline not initialized")]
    NotReady,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotReady | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers, without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::NotReady => NOT_READY_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "error": self.detail() }));
        (self.status(), body).into_response()
    }
}
