//! Icon assets rendered by the design API

use async_trait::async_trait;

use figlens_core::{IconAsset, IconError, IconSource, RawNode};

use crate::client::FigmaClient;
use crate::images::ImageFormat;

/// Fetches each candidate icon as the SVG the API renders for it
#[derive(Debug, Clone)]
pub struct RenderedIcons {
    client: FigmaClient,
    file_key: String,
}

impl RenderedIcons {
    pub fn new(client: FigmaClient, file_key: impl Into<String>) -> Self {
        Self {
            client,
            file_key: file_key.into(),
        }
    }
}

#[async_trait]
impl IconSource for RenderedIcons {
    async fn fetch_icon(&self, node: &RawNode) -> Result<IconAsset, IconError> {
        let fetch_error = |e: crate::ApiError| IconError::Fetch {
            node_id: node.id.clone(),
            message: e.to_string(),
        };

        let urls = self
            .client
            .get_image_urls(&self.file_key, &[node.id.clone()], ImageFormat::Svg, 1.0)
            .await
            .map_err(fetch_error)?;
        let url = urls
            .get(&node.id)
            .ok_or_else(|| IconError::Missing(node.id.clone()))?;
        let bytes = self.client.fetch_bytes(url).await.map_err(fetch_error)?;

        Ok(IconAsset {
            bytes,
            content_type: "image/svg+xml".to_string(),
        })
    }
}
