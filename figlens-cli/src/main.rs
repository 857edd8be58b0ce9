//! Figlens CLI
//!
//! Command-line interface for simplifying design files and serving them to
//! MCP clients.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use figlens_api::{FigmaClient, ImageRequest, RenderedIcons, DEFAULT_SCALE};
use figlens_core::{
    mask_secret, simplify, AppConfig, IconMode, IconSource, OutputFormat, Resolved, ResolvedAuth,
    SimplifyOptions,
};
use figlens_mcp::{encode, server_from_config};
use figlens_server::{run_server, AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "figlens")]
#[command(about = "Simplify design files for language-model clients")]
#[command(version)]
struct Cli {
    /// Config file (default: ./figlens.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Figma personal access token
    #[arg(long, global = true)]
    figma_api_key: Option<String>,

    /// Figma OAuth token; takes precedence over the API key
    #[arg(long, global = true)]
    figma_oauth_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (MCP at /mcp, offline simplification at /simplify)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: $PORT, then the config file, then 3333)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Simplify a saved API response (offline)
    Simplify {
        /// JSON file holding a file or nodes response
        input: PathBuf,

        /// Output format: yaml or json
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a file (or one node) from the API and simplify it
    Fetch {
        /// File key from the design URL
        file_key: String,

        /// Node to fetch, as `1:2` or `1-2`
        #[arg(short, long)]
        node_id: Option<String>,

        /// Tree depth to request
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format: yaml or json
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download rendered nodes and image fills
    Images {
        /// File key from the design URL
        file_key: String,

        /// Node to render, as `<node-id>=<file-name>` (extension picks svg or png)
        #[arg(long = "node", value_parser = parse_node_arg)]
        nodes: Vec<ImageRequest>,

        /// Image fill to download, as `<image-ref>=<file-name>`
        #[arg(long = "fill", value_parser = parse_fill_arg)]
        fills: Vec<ImageRequest>,

        /// Directory to write into
        #[arg(long)]
        out: PathBuf,

        /// PNG export scale
        #[arg(long, default_value_t = DEFAULT_SCALE)]
        scale: f64,
    },
}

fn split_assignment(arg: &str) -> Result<(&str, &str), String> {
    match arg.rsplit_once('=') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => Ok((left, right)),
        _ => Err(format!("expected <id>=<file-name>, got {:?}", arg)),
    }
}

fn parse_node_arg(arg: &str) -> Result<ImageRequest, String> {
    let (node_id, file_name) = split_assignment(arg)?;
    Ok(ImageRequest {
        node_id: node_id.to_string(),
        image_ref: None,
        file_name: file_name.to_string(),
    })
}

fn parse_fill_arg(arg: &str) -> Result<ImageRequest, String> {
    let (image_ref, file_name) = split_assignment(arg)?;
    Ok(ImageRequest {
        node_id: image_ref.to_string(),
        image_ref: Some(image_ref.to_string()),
        file_name: file_name.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so simplified output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("figlens=info")),
        )
        .init();

    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let (config, config_path) = AppConfig::load_discovered(cli.config.as_deref(), &cwd)
        .context("Failed to load configuration")?;
    if let Some(path) = &config_path {
        tracing::info!("Using config {}", path.display());
    }
    let auth = config.resolve_auth(cli.figma_api_key, cli.figma_oauth_token, |key| {
        std::env::var(key).ok()
    });

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&config, &auth, host, port).await?;
        }
        Commands::Simplify {
            input,
            format,
            output,
        } => {
            cmd_simplify(&config, &input, format, output.as_deref()).await?;
        }
        Commands::Fetch {
            file_key,
            node_id,
            depth,
            format,
            output,
        } => {
            cmd_fetch(&config, &auth, &file_key, node_id, depth, format, output.as_deref()).await?;
        }
        Commands::Images {
            file_key,
            nodes,
            fills,
            out,
            scale,
        } => {
            cmd_images(&config, &auth, &file_key, nodes, fills, &out, scale).await?;
        }
    }

    Ok(())
}

fn client_for(config: &AppConfig, auth: &ResolvedAuth) -> Result<FigmaClient> {
    let credential = auth.credential()?;
    Ok(FigmaClient::with_base_url(credential, config.figma.base_url.clone()))
}

fn describe<T: std::fmt::Display>(resolved: Option<&Resolved<T>>, masked: bool) -> String {
    match resolved {
        Some(r) if masked => {
            let value = r.value.to_string();
            format!("{} (source: {})", mask_secret(Some(value.as_str())), r.source)
        }
        Some(r) => format!("{} (source: {})", r.value, r.source),
        None => "Not Set".to_string(),
    }
}

/// Write the output to a file, or stdout
fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Start the HTTP server
async fn cmd_serve(
    config: &AppConfig,
    auth: &ResolvedAuth,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let port = config.resolve_port(port, |key| std::env::var(key).ok())?;

    println!("Configuration:");
    println!("  FIGMA_API_KEY: {}", describe(auth.api_key.as_ref(), true));
    println!("  FIGMA_OAUTH_TOKEN: {}", describe(auth.oauth_token.as_ref(), true));
    println!(
        "  Authentication: {}",
        if auth.uses_oauth() { "OAuth Bearer Token" } else { "Personal Access Token" }
    );
    println!("  PORT: {}", describe(Some(&port), false));

    let mcp = match server_from_config(config, auth) {
        Ok(server) => Some(server),
        Err(e) => {
            tracing::warn!("MCP tools disabled: {}", e);
            None
        }
    };

    let state = AppState::new(config.simplify.clone(), config.output.format, mcp);
    run_server(
        ServerConfig {
            host: host.unwrap_or_else(|| config.server.host.clone()),
            port: port.value,
        },
        state,
    )
    .await
}

/// Simplify a saved response
async fn cmd_simplify(
    config: &AppConfig,
    input: &Path,
    format: Option<OutputFormat>,
    output: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    // No API access offline, so rendered icons fall back to digests
    let options = SimplifyOptions {
        icon_mode: match config.simplify.icon_mode {
            IconMode::Rendered => IconMode::Digest,
            mode => mode,
        },
        ..config.simplify.clone()
    };
    let design = simplify(raw, None, &options).await?;

    let text = encode(&design, format.unwrap_or(config.output.format))?;
    emit(&text, output)
}

/// Fetch and simplify a remote file
async fn cmd_fetch(
    config: &AppConfig,
    auth: &ResolvedAuth,
    file_key: &str,
    node_id: Option<String>,
    depth: Option<u32>,
    format: Option<OutputFormat>,
    output: Option<&Path>,
) -> Result<()> {
    let client = client_for(config, auth)?;
    let raw = match &node_id {
        Some(node_id) => client.get_nodes(file_key, node_id, depth).await,
        None => client.get_file(file_key, depth).await,
    }
    .with_context(|| format!("Failed to fetch {}", file_key))?;

    let rendered = RenderedIcons::new(client.clone(), file_key);
    let icons: Option<&dyn IconSource> = match config.simplify.icon_mode {
        IconMode::Rendered => Some(&rendered),
        IconMode::Digest | IconMode::Off => None,
    };
    let design = simplify(raw, icons, &config.simplify).await?;

    let text = encode(&design, format.unwrap_or(config.output.format))?;
    emit(&text, output)
}

/// Download images
async fn cmd_images(
    config: &AppConfig,
    auth: &ResolvedAuth,
    file_key: &str,
    nodes: Vec<ImageRequest>,
    fills: Vec<ImageRequest>,
    out: &Path,
    scale: f64,
) -> Result<()> {
    let requests: Vec<ImageRequest> = nodes.into_iter().chain(fills).collect();
    if requests.is_empty() {
        bail!("Nothing to download: pass at least one --node or --fill");
    }

    let client = client_for(config, auth)?;
    let written = client
        .download_images(file_key, &requests, out, scale)
        .await
        .context("Failed to download images")?;

    println!("Downloaded {} of {} images:", written.len(), requests.len());
    for path in &written {
        println!("  {}", path.display());
    }
    if written.len() < requests.len() {
        bail!("{} images could not be downloaded", requests.len() - written.len());
    }
    Ok(())
}
