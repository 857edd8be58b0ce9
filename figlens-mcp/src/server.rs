//! MCP tool server
//!
//! Two tools: `get_figma_data` returns a simplified design, and
//! `download_figma_images` writes rendered nodes and image fills to disk.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;
use std::path::PathBuf;

use figlens_api::{normalize_node_id, ApiError, FigmaClient, ImageRequest, RenderedIcons, DEFAULT_SCALE};
use figlens_core::{simplify, IconMode, IconSource, OutputFormat, SimplifyError, SimplifyOptions, WireDesign};

use crate::encode::{encode, EncodeError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Simplify(#[from] SimplifyError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Parameters for get_figma_data tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFigmaDataParams {
    /// Key of the file, from a URL like figma.com/(file|design)/<fileKey>/...
    #[schemars(description = "The key of the Figma file to fetch, often found in a provided URL like figma.com/(file|design)/<fileKey>/...")]
    pub file_key: String,

    /// Node to fetch, from the URL parameter node-id=<nodeId>
    #[schemars(description = "The ID of the node to fetch, often found as URL parameter node-id=<nodeId>, always use if provided")]
    pub node_id: Option<String>,

    /// How many levels deep to traverse the node tree
    #[schemars(description = "How many levels deep to traverse the node tree, only use if explicitly requested by the user")]
    pub depth: Option<u32>,
}

/// One image for download_figma_images
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageNodeParams {
    #[schemars(description = "The ID of the Figma image node to fetch, formatted as 1234:5678")]
    pub node_id: String,

    #[schemars(description = "If a node has an imageRef fill, you must include this variable. Leave blank when downloading vector SVG images.")]
    pub image_ref: Option<String>,

    #[schemars(description = "The local name for saving the fetched file; the extension (.svg or .png) picks the format")]
    pub file_name: String,
}

/// Parameters for download_figma_images tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadImagesParams {
    #[schemars(description = "The key of the Figma file containing the nodes")]
    pub file_key: String,

    #[schemars(description = "The nodes to fetch as images")]
    pub nodes: Vec<ImageNodeParams>,

    /// Raster scale factor (default: 2)
    #[schemars(description = "Export scale for PNG images (default: 2)")]
    pub scale: Option<f64>,

    #[schemars(description = "The absolute path to the directory where images are stored. Created if it does not exist.")]
    pub local_path: String,
}

impl From<ImageNodeParams> for ImageRequest {
    fn from(params: ImageNodeParams) -> Self {
        Self {
            node_id: params.node_id,
            image_ref: params.image_ref.filter(|r| !r.is_empty()),
            file_name: params.file_name,
        }
    }
}

/// Figlens MCP Server - simplified design data for language-model clients
#[derive(Debug, Clone)]
pub struct FigmaServer {
    client: FigmaClient,
    options: SimplifyOptions,
    format: OutputFormat,
    tool_router: ToolRouter<FigmaServer>,
}

#[tool_router]
impl FigmaServer {
    pub fn new(client: FigmaClient, options: SimplifyOptions, format: OutputFormat) -> Self {
        Self {
            client,
            options,
            format,
            tool_router: Self::tool_router(),
        }
    }

    /// Fetch a file or one node of it and run it through the simplification pipeline
    pub async fn fetch_design(
        &self,
        file_key: &str,
        node_id: Option<&str>,
        depth: Option<u32>,
    ) -> Result<WireDesign, ToolError> {
        let raw = match node_id {
            Some(node_id) => {
                tracing::info!("Fetching node {} of file {}", normalize_node_id(node_id), file_key);
                self.client.get_nodes(file_key, node_id, depth).await?
            }
            None => {
                tracing::info!("Fetching file {}", file_key);
                self.client.get_file(file_key, depth).await?
            }
        };

        let rendered = RenderedIcons::new(self.client.clone(), file_key);
        let icons: Option<&dyn IconSource> = match self.options.icon_mode {
            IconMode::Rendered => Some(&rendered),
            IconMode::Digest | IconMode::Off => None,
        };
        Ok(simplify(raw, icons, &self.options).await?)
    }

    #[tool(description = "When the nodeId cannot be obtained, obtain the layout information about the entire Figma file")]
    async fn get_figma_data(
        &self,
        Parameters(params): Parameters<GetFigmaDataParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self
            .fetch_design(&params.file_key, params.node_id.as_deref(), params.depth)
            .await
            .and_then(|design| Ok(encode(&design, self.format)?));

        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                tracing::error!("get_figma_data failed for {}: {}", params.file_key, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error fetching file {}: {}",
                    params.file_key, e
                ))]))
            }
        }
    }

    #[tool(description = "Download SVG and PNG images used in a Figma file based on the IDs of image or icon nodes")]
    async fn download_figma_images(
        &self,
        Parameters(params): Parameters<DownloadImagesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let requested = params.nodes.len();
        let requests: Vec<ImageRequest> = params.nodes.into_iter().map(ImageRequest::from).collect();
        let dir = PathBuf::from(&params.local_path);

        let written = self
            .client
            .download_images(
                &params.file_key,
                &requests,
                &dir,
                params.scale.unwrap_or(DEFAULT_SCALE),
            )
            .await;

        match written {
            Ok(paths) if paths.is_empty() && requested > 0 => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Failed to download any of the {} requested images",
                    requested
                ))]))
            }
            Ok(paths) => {
                let mut lines = vec![format!("Downloaded {} of {} images:", paths.len(), requested)];
                lines.extend(paths.iter().map(|p| format!("- {}", p.display())));
                Ok(CallToolResult::success(vec![Content::text(lines.join("\n"))]))
            }
            Err(e) => {
                tracing::error!("download_figma_images failed for {}: {}", params.file_key, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error downloading images: {}",
                    e
                ))]))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for FigmaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Figlens MCP Server - fetch simplified Figma layouts and download image assets. \
                 Nodes are listed flat; the hierarchy string gives their nesting and globalVars \
                 holds the shared style values they reference."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figlens_core::Credential;

    fn offline_server() -> FigmaServer {
        // nothing listens on port 9; every request fails to connect
        let client = FigmaClient::with_base_url(
            Credential::ApiKey("figd_test".to_string()),
            "http://127.0.0.1:9/v1",
        );
        FigmaServer::new(client, SimplifyOptions::default(), OutputFormat::Yaml)
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_params_use_camel_case() {
        let params: DownloadImagesParams = serde_json::from_value(serde_json::json!({
            "fileKey": "abc",
            "nodes": [
                { "nodeId": "1:2", "fileName": "logo.svg" },
                { "nodeId": "1:3", "imageRef": "", "fileName": "photo.png" }
            ],
            "localPath": "/tmp/out"
        }))
        .unwrap();

        assert_eq!(params.file_key, "abc");
        assert!(params.scale.is_none());
        let requests: Vec<ImageRequest> = params.nodes.into_iter().map(ImageRequest::from).collect();
        assert!(requests.iter().all(|r| r.image_ref.is_none()));
    }

    #[tokio::test]
    async fn test_get_figma_data_reports_errors_as_tool_errors() {
        let server = offline_server();
        let result = server
            .get_figma_data(Parameters(GetFigmaDataParams {
                file_key: "abc".to_string(),
                node_id: Some("1-2".to_string()),
                depth: None,
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("Error fetching file abc"));
    }

    #[tokio::test]
    async fn test_download_with_no_nodes() {
        let server = offline_server();
        let dir = std::env::temp_dir();
        let result = server
            .download_figma_images(Parameters(DownloadImagesParams {
                file_key: "abc".to_string(),
                nodes: Vec::new(),
                scale: None,
                local_path: dir.display().to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(false));
        assert!(text(&result).starts_with("Downloaded 0 of 0 images"));
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = offline_server().get_info();
        assert!(info.capabilities.tools.is_some());
    }
}
