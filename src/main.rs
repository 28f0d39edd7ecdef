//! Tilenol command line
//!
//! Assembles the server capability set from flags (or their `TILENOL_*`
//! environment variables) and an optional YAML config file, then either
//! checks it or runs a feature query against a PostGIS layer.
//!
//! # Usage
//!
//! ```bash
//! # Validate config + flags and print the assembled capabilities
//! tilenol --config-file layers.yaml --redis-host localhost:6379 check
//!
//! # Same, as JSON; assembly fails unless the search backend answers
//! tilenol --config-file layers.yaml --es-host localhost:9200 check -o json
//!
//! # Decode the features of a PostGIS layer inside a bounding box
//! tilenol --config-file layers.yaml query --layer roads --bbox 0,0,1000,1000
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tilenol::backend::{Backend, Envelope};
use tilenol::{CapabilitiesSummary, ConfigSource, ServerBuilder, ServerCapabilities, ServerOption};

#[derive(Parser)]
#[command(name = "tilenol")]
#[command(version)]
#[command(about = "Assemble and check a vector tile server's backends")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServerArgs {
    /// YAML file describing the cache and layers
    #[arg(long, short = 'f', env = "TILENOL_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Port for serving tile data
    #[arg(long, short, env = "TILENOL_PORT", default_value_t = 3000)]
    port: u16,

    /// Port for administrative endpoints
    #[arg(long, env = "TILENOL_INTERNAL_PORT", default_value_t = 3001)]
    internal_port: u16,

    #[arg(long, env = "TILENOL_ENABLE_CORS")]
    enable_cors: bool,

    /// Simplify geometries based on the requested zoom level
    #[arg(long, env = "TILENOL_SIMPLIFY_SHAPES")]
    simplify_shapes: bool,

    /// Value of the Cache-Control response header
    #[arg(long, env = "TILENOL_CACHE_CONTROL", default_value = "no-cache")]
    cache_control: String,

    /// Redis host:port; overrides the config file's cache when set
    #[arg(long, env = "TILENOL_REDIS_HOST", default_value = "")]
    redis_host: String,

    /// Cache time-to-live, e.g. "30s" or "24h"
    #[arg(long, env = "TILENOL_REDIS_TTL", default_value = "")]
    redis_ttl: String,

    /// Search backend host:port
    #[arg(long, env = "TILENOL_ES_HOST")]
    es_host: Option<String>,

    /// index=geometryField mapping (repeatable)
    #[arg(long = "es-mapping", value_parser = parse_key_value)]
    es_mappings: Vec<(String, String)>,

    /// layer=min[-max] zoom override (repeatable)
    #[arg(long = "zoom-range", value_parser = parse_key_value)]
    zoom_ranges: Vec<(String, String)>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the capability set and print a summary
    Check {
        #[arg(long, short = 'o', default_value = "text", value_enum)]
        format: OutputFormat,

        /// Also wait for every layer's own search backend to report healthy
        #[arg(long)]
        ping_search: bool,
    },

    /// Print the decoded features of a PostGIS layer as JSON
    Query {
        #[arg(long)]
        layer: String,

        /// minx,miny,maxx,maxy in EPSG:3857
        #[arg(long, allow_hyphen_values = true)]
        bbox: Envelope,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

/// Options in application order: the document first, so flags given on the
/// command line win over it
fn server_options(args: &ServerArgs) -> Vec<ServerOption> {
    let mut options = Vec::new();

    if let Some(path) = &args.config_file {
        options.push(ServerOption::LoadConfig(ConfigSource::Path(path.clone())));
    }
    options.push(ServerOption::Port(args.port));
    options.push(ServerOption::InternalPort(args.internal_port));
    if args.enable_cors {
        options.push(ServerOption::EnableCors);
    }
    if args.simplify_shapes {
        options.push(ServerOption::SimplifyShapes);
    }
    options.push(ServerOption::CacheControl(args.cache_control.clone()));
    options.push(ServerOption::CacheServer(args.redis_host.clone()));
    options.push(ServerOption::CacheTtl(args.redis_ttl.clone()));
    if let Some(host) = &args.es_host {
        options.push(ServerOption::SearchHost(host.clone()));
    }
    if !args.es_mappings.is_empty() {
        options.push(ServerOption::SearchFieldMappings(
            args.es_mappings.iter().cloned().collect(),
        ));
    }
    if !args.zoom_ranges.is_empty() {
        options.push(ServerOption::ZoomRanges(args.zoom_ranges.iter().cloned().collect()));
    }

    options
}

fn print_summary(summary: &CapabilitiesSummary) {
    println!("port:           {}", summary.port);
    println!("internal port:  {}", summary.internal_port);
    println!("cors:           {}", summary.enable_cors);
    println!("simplify:       {}", summary.simplify);
    println!(
        "cache:          {}",
        summary.cache_server.as_deref().unwrap_or("disabled")
    );
    if let Some(ttl) = &summary.cache_ttl {
        println!("cache ttl:      {}", ttl);
    }
    if let Some(cache_control) = &summary.cache_control {
        println!("cache-control:  {}", cache_control);
    }
    if let Some(url) = &summary.search_url {
        println!("search:         {}", url);
    }
    println!("layers:         {}", summary.layers.len());
    for layer in &summary.layers {
        println!(
            "  {} [{}] z{}-{} geometry={}",
            layer.name, layer.backend, layer.minzoom, layer.maxzoom, layer.geometry_field
        );
    }
}

/// The `--es-host` client was already health checked during assembly
async fn ping_layer_search_backends(caps: &ServerCapabilities) -> anyhow::Result<()> {
    for layer in caps.layers() {
        if let Backend::Elasticsearch(es) = &layer.backend {
            es.client()
                .wait_until_healthy()
                .await
                .with_context(|| format!("layer '{}'", layer.name))?;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let caps = ServerBuilder::new()
        .options(server_options(&cli.server))
        .build()
        .await
        .context("Failed to assemble server")?;

    match cli.command {
        Commands::Check {
            format,
            ping_search,
        } => {
            if ping_search {
                ping_layer_search_backends(&caps).await?;
            }
            let summary = caps.summary();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => print_summary(&summary),
            }
        }
        Commands::Query { layer, bbox } => {
            let Some(found) = caps.layer(&layer) else {
                bail!("No layer named '{}'", layer);
            };
            let Backend::Postgis(postgis) = &found.backend else {
                bail!(
                    "Layer '{}' uses the {} backend; only postgis layers can be queried",
                    layer,
                    found.backend.kind()
                );
            };
            let features = postgis.fetch_features(&bbox).await?;
            tracing::info!(layer = %layer, features = features.len(), "Query complete");
            println!("{}", serde_json::to_string_pretty(&features)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilenol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
