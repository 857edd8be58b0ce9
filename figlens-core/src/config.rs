//! Figlens configuration
//!
//! Defines the `figlens.toml` format and how credentials and the server
//! port are resolved from CLI flags, the environment and the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::icons::IconMode;
use crate::vars::{DedupMode, GlobalVars};

pub const CONFIG_FILE_NAME: &str = "figlens.toml";
pub const ENV_API_KEY: &str = "FIGMA_API_KEY";
pub const ENV_OAUTH_TOKEN: &str = "FIGMA_OAUTH_TOKEN";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid port {value:?} from {origin}")]
    InvalidPort { value: String, origin: ConfigSource },

    #[error("no Figma credentials: set FIGMA_API_KEY or FIGMA_OAUTH_TOKEN, or pass one on the command line")]
    MissingCredentials,
}

/// The whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub figma: FigmaConfig,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simplify: SimplifyOptions,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Design API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigmaConfig {
    /// Personal access token, sent as `X-Figma-Token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth bearer token; preferred over `api_key` when both are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://api.figma.com/v1".to_string()
}

impl Default for FigmaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            oauth_token: None,
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3333
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Knobs for one simplification run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifyOptions {
    #[serde(default)]
    pub icon_mode: IconMode,

    #[serde(default)]
    pub dedup: DedupMode,

    /// Fixes the variable-id nonce stream; random when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SimplifyOptions {
    pub fn new_vars(&self) -> GlobalVars {
        match self.seed {
            Some(seed) => GlobalVars::with_seed(self.dedup, seed),
            None => GlobalVars::new(self.dedup),
        }
    }
}

/// Response encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::File => "config file",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ConfigSource,
}

/// Credential used against the design API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    OAuth(String),
}

/// Resolved credentials, with both candidates kept for the startup summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuth {
    pub api_key: Option<Resolved<String>>,
    pub oauth_token: Option<Resolved<String>>,
}

impl ResolvedAuth {
    /// The credential to use: an OAuth token wins over an API key
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        if let Some(token) = &self.oauth_token {
            return Ok(Credential::OAuth(token.value.clone()));
        }
        if let Some(key) = &self.api_key {
            return Ok(Credential::ApiKey(key.value.clone()));
        }
        Err(ConfigError::MissingCredentials)
    }

    pub fn uses_oauth(&self) -> bool {
        self.oauth_token.is_some()
    }
}

fn pick(
    cli: Option<String>,
    env: Option<String>,
    file: Option<String>,
) -> Option<Resolved<String>> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    if let Some(value) = non_empty(cli) {
        return Some(Resolved { value, source: ConfigSource::Cli });
    }
    if let Some(value) = non_empty(env) {
        return Some(Resolved { value, source: ConfigSource::Env });
    }
    non_empty(file).map(|value| Resolved { value, source: ConfigSource::File })
}

impl AppConfig {
    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the config file: explicit path, `./figlens.toml`, then the user config dir
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("figlens").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Discover and load; returns the path that was used, if any
    pub fn load_discovered(
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match Self::discover(explicit, cwd) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Resolve credentials: CLI flag > environment > config file
    pub fn resolve_auth(
        &self,
        cli_api_key: Option<String>,
        cli_oauth_token: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ResolvedAuth {
        ResolvedAuth {
            api_key: pick(cli_api_key, env(ENV_API_KEY), self.figma.api_key.clone()),
            oauth_token: pick(
                cli_oauth_token,
                env(ENV_OAUTH_TOKEN),
                self.figma.oauth_token.clone(),
            ),
        }
    }

    /// Resolve the server port: CLI flag > `PORT` > config file > 3333
    pub fn resolve_port(
        &self,
        cli_port: Option<u16>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Resolved<u16>, ConfigError> {
        if let Some(port) = cli_port {
            return Ok(Resolved { value: port, source: ConfigSource::Cli });
        }
        if let Some(raw) = env(ENV_PORT).filter(|s| !s.trim().is_empty()) {
            let value = raw.trim().parse().map_err(|_| ConfigError::InvalidPort {
                value: raw.clone(),
                origin: ConfigSource::Env,
            })?;
            return Ok(Resolved { value, source: ConfigSource::Env });
        }
        if self.server.port != default_port() {
            return Ok(Resolved { value: self.server.port, source: ConfigSource::File });
        }
        Ok(Resolved { value: default_port(), source: ConfigSource::Default })
    }
}

/// Mask a secret for logging: `abcd...wxyz`, `****` when short, `Not Set` when absent
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None | Some("") => "Not Set".to_string(),
        Some(s) if s.chars().count() <= 8 => "****".to_string(),
        Some(s) => {
            let chars: Vec<char> = s.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.figma.base_url, "https://api.figma.com/v1");
        assert_eq!(config.simplify.icon_mode, IconMode::Digest);
        assert_eq!(config.simplify.dedup, DedupMode::InsertionOrder);
        assert_eq!(config.output.format, OutputFormat::Yaml);
    }

    #[test]
    fn test_parse_full_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [figma]
            api_key = "figd_file_key_123"

            [server]
            port = 4000

            [simplify]
            icon_mode = "rendered"
            dedup = "canonical"
            seed = 9

            [output]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.figma.api_key.as_deref(), Some("figd_file_key_123"));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.simplify.icon_mode, IconMode::Rendered);
        assert_eq!(config.simplify.dedup, DedupMode::Canonical);
        assert_eq!(config.simplify.seed, Some(9));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_credential_precedence() {
        let mut config = AppConfig::default();
        config.figma.api_key = Some("from-file".to_string());

        let auth = config.resolve_auth(None, None, env(&[]));
        assert_eq!(auth.api_key.as_ref().unwrap().source, ConfigSource::File);

        let auth = config.resolve_auth(None, None, env(&[(ENV_API_KEY, "from-env")]));
        assert_eq!(auth.api_key.as_ref().unwrap().value, "from-env");
        assert_eq!(auth.api_key.as_ref().unwrap().source, ConfigSource::Env);

        let auth = config.resolve_auth(
            Some("from-cli".to_string()),
            None,
            env(&[(ENV_API_KEY, "from-env")]),
        );
        assert_eq!(auth.api_key.as_ref().unwrap().source, ConfigSource::Cli);
        assert_eq!(auth.credential().unwrap(), Credential::ApiKey("from-cli".to_string()));
    }

    #[test]
    fn test_oauth_wins() {
        let config = AppConfig::default();
        let auth = config.resolve_auth(
            Some("key".to_string()),
            None,
            env(&[(ENV_OAUTH_TOKEN, "token")]),
        );
        assert!(auth.uses_oauth());
        assert_eq!(auth.credential().unwrap(), Credential::OAuth("token".to_string()));
    }

    #[test]
    fn test_missing_credentials() {
        let auth = AppConfig::default().resolve_auth(None, Some("  ".to_string()), env(&[]));
        assert!(matches!(auth.credential(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_port_resolution() {
        let mut config = AppConfig::default();
        let port = config.resolve_port(None, env(&[])).unwrap();
        assert_eq!((port.value, port.source), (3333, ConfigSource::Default));

        config.server.port = 4000;
        let port = config.resolve_port(None, env(&[])).unwrap();
        assert_eq!((port.value, port.source), (4000, ConfigSource::File));

        let port = config.resolve_port(None, env(&[(ENV_PORT, "5000")])).unwrap();
        assert_eq!((port.value, port.source), (5000, ConfigSource::Env));

        let port = config.resolve_port(Some(6000), env(&[(ENV_PORT, "5000")])).unwrap();
        assert_eq!((port.value, port.source), (6000, ConfigSource::Cli));

        assert!(matches!(
            config.resolve_port(None, env(&[(ENV_PORT, "http")])),
            Err(ConfigError::InvalidPort { .. })
        ));
    }

    #[test]
    fn test_discover_prefers_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&local, "[server]\nport = 8080\n").unwrap();

        assert_eq!(AppConfig::discover(None, dir.path()), Some(local.clone()));

        let explicit = dir.path().join("other.toml");
        assert_eq!(AppConfig::discover(Some(&explicit), dir.path()), Some(explicit));

        let (config, path) = AppConfig::load_discovered(None, dir.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(path, Some(local));
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(missing, AppConfig::default());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[server\nport = ").unwrap();
        assert!(matches!(AppConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(None), "Not Set");
        assert_eq!(mask_secret(Some("short")), "****");
        assert_eq!(mask_secret(Some("figd_abcdefghijkl")), "figd...ijkl");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
