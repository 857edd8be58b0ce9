//! Figlens Server
//!
//! HTTP front end: the MCP tool service over streamable HTTP at `/mcp`,
//! offline simplification at `/simplify`, and a health check.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use figlens_core::{simplify, OutputFormat, SimplifyOptions};
use figlens_mcp::{encode, FigmaServer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3333,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Options for offline simplification
    pub options: SimplifyOptions,

    /// Default encoding of `/simplify` responses
    pub format: OutputFormat,

    /// MCP tool server; `/mcp` is only mounted when credentials were configured
    pub mcp: Option<FigmaServer>,
}

impl AppState {
    pub fn new(options: SimplifyOptions, format: OutputFormat, mcp: Option<FigmaServer>) -> Arc<Self> {
        Arc::new(Self {
            options,
            format,
            mcp,
        })
    }
}

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handle_health))
        .route("/simplify", post(handle_simplify));

    if let Some(server) = state.mcp.clone() {
        let service = StreamableHttpService::new(
            move || Ok(server.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );
        router = router.nest_service("/mcp", service);
    }

    router
        .with_state(state)
        // Design files can be large
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mcp": state.mcp.is_some()
    }))
}

#[derive(Debug, Deserialize)]
pub struct SimplifyQuery {
    pub format: Option<OutputFormat>,
}

/// Simplify a raw design response posted as the request body
async fn handle_simplify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SimplifyQuery>,
    Json(raw): Json<serde_json::Value>,
) -> Response {
    let design = match simplify(raw, None, &state.options).await {
        Ok(design) => design,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };

    let format = query.format.unwrap_or(state.format);
    let content_type = match format {
        OutputFormat::Yaml => "application/yaml",
        OutputFormat::Json => "application/json",
    };
    match encode(&design, format) {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

/// Run the server
pub async fn run_server(config: ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let mcp_enabled = state.mcp.is_some();
    let router = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Figlens server listening on {}", addr);
    if mcp_enabled {
        tracing::info!("MCP endpoint: http://{}/mcp", addr);
    } else {
        tracing::warn!("No credentials configured; /mcp is disabled");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        AppState::new(
            SimplifyOptions {
                seed: Some(1),
                ..Default::default()
            },
            OutputFormat::Yaml,
            None,
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mcp"], false);
    }

    #[tokio::test]
    async fn test_simplify_json() {
        let raw = serde_json::json!({
            "name": "Kit",
            "document": {
                "id": "0:0",
                "type": "DOCUMENT",
                "children": [{
                    "id": "1:1",
                    "type": "FRAME",
                    "name": "Card",
                    "children": [{ "id": "1:2", "type": "TEXT", "name": "Title", "characters": "Hi" }]
                }]
            }
        });
        let response = create_router(state())
            .oneshot(post_json("/simplify?format=json", raw))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["name"], "Kit");
        assert_eq!(body["hierarchy"], "1:1(1:2)");
    }

    #[tokio::test]
    async fn test_simplify_defaults_to_yaml() {
        let raw = serde_json::json!({ "name": "Empty" });
        let response = create_router(state())
            .oneshot(post_json("/simplify", raw))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("name: Empty"));
    }

    #[tokio::test]
    async fn test_simplify_rejects_non_object() {
        let response = create_router(state())
            .oneshot(post_json("/simplify", serde_json::json!([1, 2])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid design response"));
    }

    #[tokio::test]
    async fn test_mcp_is_mounted_with_credentials() {
        let client = figlens_api::FigmaClient::new(figlens_core::Credential::ApiKey(
            "figd_test".to_string(),
        ));
        let server = FigmaServer::new(client, SimplifyOptions::default(), OutputFormat::Json);
        let state = AppState::new(SimplifyOptions::default(), OutputFormat::Json, Some(server));

        let response = create_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["mcp"], true);
    }
}
