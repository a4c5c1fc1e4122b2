use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{health, query};
use crate::state::AppState;

/// Routes plus CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/medical-query", post(query::medical_query))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// An empty origin list allows any origin; a configured list restricts to it.
fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let origins = resolve_allowed_origins(configured);

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AppPaths, Settings};
    use crate::state::PipelineStatus;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    const FOREIGN_ORIGIN: &str = "https://medibot-frontend.example";

    fn app(dir: &std::path::Path, cors_allowed_origins: Vec<String>) -> Router {
        let paths = Arc::new(AppPaths::with_dirs(dir.to_path_buf(), dir.join("data")));
        let mut settings = Settings::default();
        settings.server.cors_allowed_origins = cors_allowed_origins;
        let state = AppState::new(
            paths,
            settings,
            PipelineStatus::Unavailable("no index".to_string()),
            None,
        );
        router(Arc::new(state))
    }

    fn query_request() -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/medical-query")
            .header(header::ORIGIN, FOREIGN_ORIGIN)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "query": "What is gout?" }).to_string()))
            .unwrap()
    }

    #[test]
    fn blank_entries_are_dropped() {
        let configured = vec![" https://medibot.example ".to_string(), "  ".to_string()];
        assert_eq!(
            resolve_allowed_origins(&configured),
            vec!["https://medibot.example".to_string()]
        );
        assert!(resolve_allowed_origins(&[]).is_empty());
    }

    #[tokio::test]
    async fn any_origin_is_allowed_by_default() {
        let tmp = tempfile::tempdir().unwrap();

        let response = app(tmp.path(), Vec::new()).oneshot(query_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn configured_origins_restrict_access() {
        let tmp = tempfile::tempdir().unwrap();
        let allowed = vec!["http://localhost:5173".to_string()];

        let response = app(tmp.path(), allowed).oneshot(query_request()).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn configured_origin_is_echoed_back() {
        let tmp = tempfile::tempdir().unwrap();

        let response = app(tmp.path(), vec![FOREIGN_ORIGIN.to_string()])
            .oneshot(query_request())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            FOREIGN_ORIGIN
        );
    }
}
