//! OTG MCP Server
//!
//! Serves Open Traffic Generator targets as MCP tools over stdio or HTTP.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use otg_mcp::config::{load_config, parse_log_level, validate_config, TransportMode};
use otg_mcp::mcp::McpServer;
use otg_mcp::otg::TargetRegistry;
use otg_mcp::schema::SchemaRegistry;
use otg_mcp::tools::otg_tools;
use otg_mcp::VERSION;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "otg-mcp",
    author = "OTG MCP Contributors",
    version = VERSION,
    about = "MCP server for Open Traffic Generator targets",
    long_about = None
)]
struct Args {
    /// Path to the targets configuration file
    #[arg(long, env = "OTG_MCP_CONFIG")]
    config_file: Option<PathBuf>,

    /// Transport to serve MCP over (stdio or http)
    #[arg(long)]
    transport: Option<TransportMode>,

    /// Bind address for the HTTP transport
    #[arg(long)]
    bind: Option<String>,

    /// Port for the HTTP transport
    #[arg(long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); overrides LOG_LEVEL and the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Directory with additional `<version>/openapi.yaml` schemas
    #[arg(long)]
    schema_dir: Option<PathBuf>,
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},otg_mcp={level}"))
}

/// Level used until the config file is read: `--log-level`, then `LOG_LEVEL`, then `info`
fn startup_level(cli: Option<&str>, env: Option<&str>) -> otg_mcp::Result<String> {
    match cli {
        Some(level) => parse_log_level(level),
        None => Ok(env
            .and_then(|level| parse_log_level(level).ok())
            .unwrap_or_else(|| "info".to_string())),
    }
}

/// Subscriber whose filter can be swapped once the configured level is known
fn build_subscriber<W>(
    filter: EnvFilter,
    format: LogFormat,
    writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(fmt::layer().with_writer(writer)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(writer))),
    };
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json);
    (subscriber, handle)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    // Installed before config loading so skipped targets and ports are reported
    let rust_log = std::env::var("RUST_LOG").ok().filter(|spec| !spec.is_empty());
    let early_level = startup_level(
        args.log_level.as_deref(),
        std::env::var("LOG_LEVEL").ok().as_deref(),
    )?;
    let filter = match &rust_log {
        Some(spec) => EnvFilter::new(spec),
        None => level_filter(&early_level),
    };
    // stdout carries the protocol in stdio mode
    let (subscriber, log_filter) = build_subscriber(filter, args.log_format, std::io::stderr);
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;

    info!("Starting OTG MCP server v{}", VERSION);

    let mut config = load_config(args.config_file.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.server.log_level = parse_log_level(level)?;
    }
    if rust_log.is_none() && config.server.log_level != early_level {
        log_filter
            .reload(level_filter(&config.server.log_level))
            .context("Failed to apply configured log level")?;
    }
    info!("Loaded configuration with {} targets", config.targets.len());

    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.schema_dir {
        config.schema_dir = Some(dir);
    }

    let schemas = match &config.schema_dir {
        Some(dir) => SchemaRegistry::with_schema_dir(dir).context("Failed to scan schema directory")?,
        None => SchemaRegistry::bundled(),
    };

    let validation = validate_config(&config, &schemas.list_versions());
    for issue in &validation.warnings {
        warn!("Config warning: {}", issue);
    }
    if !validation.valid {
        for issue in &validation.errors {
            error!("Config error: {}", issue);
        }
        anyhow::bail!("Invalid configuration ({} errors)", validation.errors.len());
    }

    let server_config = config.server.clone();
    let targets = Arc::new(TargetRegistry::new(config, Arc::new(schemas)));
    info!("Configured targets: {:?}", targets.list_targets());

    let server = Arc::new(McpServer::new(otg_tools(targets.clone())));

    match server_config.transport {
        TransportMode::Stdio => {
            tokio::select! {
                result = server.run_stdio() => result?,
                _ = shutdown_signal() => {}
            }
        }
        TransportMode::Http => {
            let addr: SocketAddr = format!("{}:{}", server_config.bind, server_config.port)
                .parse()
                .with_context(|| format!("Invalid bind address {}:{}", server_config.bind, server_config.port))?;
            server.run_http(addr, shutdown_signal()).await?;
        }
    }

    targets.shutdown().await;
    info!("OTG MCP server stopped");
    Ok(())
}
