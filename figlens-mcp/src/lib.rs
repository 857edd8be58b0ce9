//! Figlens MCP
//!
//! MCP tool server over the simplification pipeline. The stdio binary lives
//! in `main.rs`; `figlens-server` hosts the same service over HTTP.

pub mod encode;
pub mod server;

pub use encode::{encode, EncodeError};
pub use server::{FigmaServer, ToolError};

use figlens_api::FigmaClient;
use figlens_core::{AppConfig, ResolvedAuth};

/// Build the server from loaded config and resolved credentials
pub fn server_from_config(config: &AppConfig, auth: &ResolvedAuth) -> Result<FigmaServer, figlens_core::ConfigError> {
    let client = FigmaClient::with_base_url(auth.credential()?, config.figma.base_url.clone());
    Ok(FigmaServer::new(
        client,
        config.simplify.clone(),
        config.output.format,
    ))
}
