//! Client tests against a local stand-in for the design API

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use figlens_api::{ApiError, FigmaClient, ImageRequest, RenderedIcons};
use figlens_core::{Credential, IconSource, RawNode};

const TOKEN: &str = "figd_test_token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("X-Figma-Token")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TOKEN)
}

fn forbidden() -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "status": 403, "err": "Invalid token" })),
    )
        .into_response()
}

async fn file(headers: HeaderMap, Path(key): Path<String>) -> axum::response::Response {
    if !authorized(&headers) {
        return forbidden();
    }
    Json(json!({
        "name": format!("File {}", key),
        "document": { "id": "0:0", "type": "DOCUMENT", "children": [] }
    }))
    .into_response()
}

async fn nodes(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return forbidden();
    }
    let id = query.get("ids").cloned().unwrap_or_default();
    let mut entries = serde_json::Map::new();
    entries.insert(
        id.clone(),
        json!({ "document": { "id": id, "type": "FRAME", "name": "Frame" } }),
    );
    Json(json!({
        "name": "Nodes",
        "depth": query.get("depth"),
        "nodes": entries
    }))
    .into_response()
}

async fn images(
    State(base): State<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let format = query.get("format").cloned().unwrap_or_default();
    let images: serde_json::Map<String, Value> = query
        .get("ids")
        .map(|ids| ids.split(',').map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|id| {
            let url = if id == "9:9" {
                Value::Null
            } else {
                json!(format!("{}/assets/{}.{}", base, id.replace(':', "_"), format))
            };
            (id, url)
        })
        .collect();
    Json(json!({ "err": null, "images": images }))
}

async fn image_fills(State(base): State<String>) -> Json<Value> {
    Json(json!({
        "error": false,
        "status": 200,
        "meta": { "images": { "ref1": format!("{}/assets/ref1.png", base) } }
    }))
}

async fn asset(Path(name): Path<String>) -> impl IntoResponse {
    format!("asset:{}", name)
}

async fn spawn() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let router = Router::new()
        .route("/v1/files/:key", get(file))
        .route("/v1/files/:key/nodes", get(nodes))
        .route("/v1/files/:key/images", get(image_fills))
        .route("/v1/images/:key", get(images))
        .route("/assets/:name", get(asset))
        .with_state(base.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn client(base: &str, token: &str) -> FigmaClient {
    FigmaClient::with_base_url(
        Credential::ApiKey(token.to_string()),
        format!("{}/v1", base),
    )
}

#[tokio::test]
async fn test_get_file() {
    let base = spawn().await;
    let file = client(&base, TOKEN).get_file("abc", Some(2)).await.unwrap();
    assert_eq!(file["name"], "File abc");
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let base = spawn().await;
    let err = client(&base, "wrong").get_file("abc", None).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid token");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_get_nodes_normalizes_the_id() {
    let base = spawn().await;
    let resp = client(&base, TOKEN).get_nodes("abc", "12-34", Some(1)).await.unwrap();
    assert_eq!(resp["nodes"]["12:34"]["document"]["id"], "12:34");
    assert_eq!(resp["depth"], "1");
}

#[tokio::test]
async fn test_download_images() {
    let base = spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let requests = vec![
        ImageRequest {
            node_id: "1-2".to_string(),
            image_ref: None,
            file_name: "logo.svg".to_string(),
        },
        ImageRequest {
            node_id: "1:3".to_string(),
            image_ref: Some("ref1".to_string()),
            file_name: "photo.png".to_string(),
        },
        ImageRequest {
            node_id: "9:9".to_string(),
            image_ref: None,
            file_name: "missing.png".to_string(),
        },
        ImageRequest {
            node_id: "1:4".to_string(),
            image_ref: Some("unknown-ref".to_string()),
            file_name: "nope.png".to_string(),
        },
    ];

    let written = client(&base, TOKEN)
        .download_images("abc", &requests, dir.path(), 2.0)
        .await
        .unwrap();

    assert_eq!(
        written,
        vec![dir.path().join("logo.svg"), dir.path().join("photo.png")]
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("logo.svg")).unwrap(),
        "asset:1_2.svg"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("photo.png")).unwrap(),
        "asset:ref1.png"
    );
    assert!(!dir.path().join("missing.png").exists());
}

#[tokio::test]
async fn test_rendered_icons() {
    let base = spawn().await;
    let icons = RenderedIcons::new(client(&base, TOKEN), "abc");

    let node = RawNode::ingest(json!({ "id": "5:6", "type": "GROUP", "name": "icon" })).unwrap();
    let asset = icons.fetch_icon(&node).await.unwrap();
    assert_eq!(asset.content_type, "image/svg+xml");
    assert_eq!(asset.bytes, b"asset:5_6.svg".to_vec());

    let missing = RawNode::ingest(json!({ "id": "9:9", "type": "GROUP" })).unwrap();
    assert!(icons.fetch_icon(&missing).await.is_err());
}
