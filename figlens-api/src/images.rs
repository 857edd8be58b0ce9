//! Rendered images and image fills

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::client::{normalize_node_id, ApiError, FigmaClient};

pub const DEFAULT_SCALE: f64 = 2.0;

/// Render format, picked from the requested file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Png)
    }

    /// `.svg` renders as SVG; anything else falls back to PNG
    pub fn from_file_name(file_name: &str) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Self::Svg,
            Some("png") => Self::Png,
            _ => {
                tracing::warn!("Unsupported file type for {}, using png", file_name);
                Self::Png
            }
        }
    }
}

/// One image to download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub node_id: String,
    /// Set for image fills; the node is rendered otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub file_name: String,
}

/// Reject names that would escape the target directory
fn checked_file_name(file_name: &str) -> Result<&str, ApiError> {
    let plain = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n == file_name);
    plain.ok_or_else(|| ApiError::InvalidFileName(file_name.to_string()))
}

impl FigmaClient {
    /// Download `url` into `dir/file_name`, creating `dir` if needed
    pub async fn download(
        &self,
        url: &str,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, ApiError> {
        let file_name = checked_file_name(file_name)?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ApiError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let bytes = self.fetch_bytes(url).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ApiError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Download image fills and rendered nodes into `dir`.
    ///
    /// Requests whose URL cannot be resolved, or whose download fails, are
    /// logged and skipped; the paths actually written are returned in
    /// request order.
    pub async fn download_images(
        &self,
        file_key: &str,
        requests: &[ImageRequest],
        dir: &Path,
        scale: f64,
    ) -> Result<Vec<PathBuf>, ApiError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let wants_fills = requests.iter().any(|r| r.image_ref.is_some());
        let fill_urls = if wants_fills {
            match self.get_image_fill_urls(file_key).await {
                Ok(urls) => urls,
                Err(e) => {
                    tracing::error!("Failed to get image fills for {}: {}", file_key, e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        let mut render_urls: BTreeMap<(ImageFormat, String), String> = BTreeMap::new();
        for format in [ImageFormat::Svg, ImageFormat::Png] {
            let ids: Vec<String> = requests
                .iter()
                .filter(|r| r.image_ref.is_none())
                .filter(|r| ImageFormat::from_file_name(&r.file_name) == format)
                .map(|r| normalize_node_id(&r.node_id))
                .collect();
            if ids.is_empty() {
                continue;
            }
            match self.get_image_urls(file_key, &ids, format, scale).await {
                Ok(urls) => render_urls.extend(urls.into_iter().map(|(id, url)| ((format, id), url))),
                Err(e) => tracing::error!(
                    "Failed to get {} renders for {}: {}",
                    format.as_str(),
                    file_key,
                    e
                ),
            }
        }

        let mut downloads = Vec::new();
        for request in requests {
            let url = match &request.image_ref {
                Some(image_ref) => fill_urls.get(image_ref),
                None => {
                    let format = ImageFormat::from_file_name(&request.file_name);
                    render_urls.get(&(format, normalize_node_id(&request.node_id)))
                }
            };
            match url {
                Some(url) => downloads.push(self.download(url, dir, &request.file_name)),
                None => tracing::warn!(
                    "No image URL for node {} ({})",
                    request.node_id,
                    request.file_name
                ),
            }
        }

        let mut written = Vec::new();
        for result in join_all(downloads).await {
            match result {
                Ok(path) => written.push(path),
                Err(e) => tracing::error!("Image download failed: {}", e),
            }
        }
        Ok(written)
    }
}
