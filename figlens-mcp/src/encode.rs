//! Response encoding for tool output

use serde::Serialize;

use figlens_core::OutputFormat;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a response body in the configured format
pub fn encode<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, EncodeError> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}
