//! HTTP client for the design REST API

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use figlens_core::Credential;

pub const DEFAULT_BASE_URL: &str = "https://api.figma.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("design API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file name {0:?}: must be a plain file name")]
    InvalidFileName(String),
}

/// Convert a node id from URL form (`1-2`) to API form (`1:2`)
pub fn normalize_node_id(id: &str) -> String {
    id.trim().replace('-', ":")
}

/// Authentication header for a credential
pub fn auth_header(credential: &Credential) -> (&'static str, String) {
    match credential {
        Credential::ApiKey(key) => ("X-Figma-Token", key.clone()),
        Credential::OAuth(token) => ("Authorization", format!("Bearer {}", token)),
    }
}

/// Status and message of a failed call, from the API's `err`/`message` body fields
pub(crate) fn error_from_body(http_status: u16, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        status: Option<u16>,
        err: Option<String>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ApiError::Status {
            status: parsed.status.unwrap_or(http_status),
            message: parsed
                .err
                .or(parsed.message)
                .unwrap_or_else(|| body.to_string()),
        },
        Err(_) => ApiError::Status {
            status: http_status,
            message: body.to_string(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    images: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ImageFillsResponse {
    #[serde(default)]
    meta: ImageFillsMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ImageFillsMeta {
    #[serde(default)]
    images: BTreeMap<String, String>,
}

/// Client for the design API
#[derive(Debug, Clone)]
pub struct FigmaClient {
    client: reqwest::Client,
    base_url: String,
    auth: Credential,
}

impl FigmaClient {
    pub fn new(auth: Credential) -> Self {
        Self::with_base_url(auth, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(auth: Credential, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uses_oauth(&self) -> bool {
        matches!(self.auth, Credential::OAuth(_))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let (header, value) = auth_header(&self.auth);
        tracing::debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header(header, value)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| ApiError::Request {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &body);
            tracing::error!("Request to {} failed: {}", url, err);
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }

    /// Fetch a whole file
    pub async fn get_file(&self, file_key: &str, depth: Option<u32>) -> Result<Value, ApiError> {
        let mut query = Vec::new();
        if let Some(depth) = depth {
            query.push(("depth", depth.to_string()));
        }
        self.get(&format!("/files/{}", file_key), &query).await
    }

    /// Fetch one node (and its subtree) of a file
    pub async fn get_nodes(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> Result<Value, ApiError> {
        let mut query = vec![("ids", normalize_node_id(node_id))];
        if let Some(depth) = depth {
            query.push(("depth", depth.to_string()));
        }
        self.get(&format!("/files/{}/nodes", file_key), &query).await
    }

    /// Render URLs for nodes. Nodes the API could not render are left out.
    pub async fn get_image_urls(
        &self,
        file_key: &str,
        ids: &[String],
        format: crate::ImageFormat,
        scale: f64,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let ids: Vec<String> = ids.iter().map(|id| normalize_node_id(id)).collect();
        let mut query = vec![
            ("ids", ids.join(",")),
            ("format", format.as_str().to_string()),
        ];
        if format.is_raster() {
            query.push(("scale", scale.to_string()));
        }

        let resp: ImagesResponse = self
            .get(&format!("/images/{}", file_key), &query)
            .await?;
        Ok(resp
            .images
            .into_iter()
            .filter_map(|(id, url)| url.map(|url| (id, url)))
            .collect())
    }

    /// Download URLs for every image fill in a file, keyed by `imageRef`
    pub async fn get_image_fill_urls(
        &self,
        file_key: &str,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let resp: ImageFillsResponse = self
            .get(&format!("/files/{}/images", file_key), &[])
            .await?;
        Ok(resp.meta.images)
    }

    /// Fetch raw bytes from a render or fill URL. These are pre-signed, so no auth header.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let request_error = |source| ApiError::Request {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(request_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }
        let bytes = resp.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}
