use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::medical::MedicalQueryResponse;
use crate::rag::PromptTemplate;
use crate::state::AppState;

const MISSING_QUERY: &str = "Missing query parameter";

/// `POST /api/medical-query`
///
/// The body is parsed by hand so that a missing or malformed `query` always
/// maps to the same 400 body, before pipeline readiness is checked.
pub async fn medical_query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let query = parse_query(&body)?;
    let pipeline = state.pipeline.ready()?;

    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, "Medical query received ({} chars)", query.chars().count());
    tracing::debug!(%request_id, "Query: {}", query);

    let output = pipeline
        .chain(PromptTemplate::medical_query())
        .invoke(&query)
        .await
        .map_err(|err| {
            tracing::error!(%request_id, "Medical query failed: {}", err);
            err
        })?;

    let response = MedicalQueryResponse::assemble(output);
    tracing::info!(
        %request_id,
        "Medical query answered with {} sources",
        response.sources.len()
    );
    Ok(Json(response))
}

fn parse_query(body: &[u8]) -> Result<String, ApiError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest(MISSING_QUERY.to_string()))?;

    payload
        .get("query")
        .and_then(|v| v.as_str())
        .filter(|q| !q.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(MISSING_QUERY.to_string()))
}
