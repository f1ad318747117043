//! Flowsite main entry point
//!
//! This is the command-line interface for the Flowsite page server.

use anyhow::{bail, Context};
use clap::Parser;
use flowsite::config::{load_config_with_hash, Config};
use flowsite::normalize_page_path;
use flowsite::server::{build_router, PageServer, StoreWriter};
use flowsite::storage::{open_storage, FlowRepository, NewFlow, SqliteFlowStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Flowsite: websites generated by a flow pipeline
///
/// Flowsite serves the pages a flow generates, keeps generated pages in the
/// flow's page store, and can restrict generation to pages linked from pages
/// it already served.
#[derive(Parser, Debug)]
#[command(name = "flowsite")]
#[command(version)]
#[command(about = "Serve websites generated by a flow pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print it without serving
    #[arg(long, conflicts_with_all = ["import", "list_pages", "drop_page"])]
    dry_run: bool,

    /// Insert the flow document in FILE and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["list_pages", "drop_page"])]
    import: Option<PathBuf>,

    /// Print the stored pages of FLOW and exit
    #[arg(long, value_name = "FLOW", conflicts_with = "drop_page")]
    list_pages: Option<String>,

    /// Remove PATH from the page stores of --flow and exit
    #[arg(long, value_name = "PATH", requires = "flow")]
    drop_page: Option<String>,

    /// Flow id or endpoint name for --drop-page
    #[arg(long, value_name = "FLOW")]
    flow: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else if let Some(file) = &cli.import {
        handle_import(&config, file)
    } else if let Some(flow) = &cli.list_pages {
        handle_list_pages(&config, flow)
    } else if let Some(path) = &cli.drop_page {
        let flow = cli.flow.as_deref().context("--drop-page requires --flow")?;
        handle_drop_page(&config, flow, path)
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flowsite=info,warn"),
            1 => EnvFilter::new("flowsite=debug,info"),
            2 => EnvFilter::new("flowsite=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_flows(config: &Config) -> anyhow::Result<SqliteFlowStore> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the --dry-run mode: validates config and prints what would be served
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Flowsite Dry Run ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nGeneration:");
    println!("  Endpoint: {}", config.generation.endpoint);
    println!("  Timeout: {}s", config.generation.timeout_secs);
    println!("  Output component: {}", config.generation.output_component);
    println!(
        "  API key: {}",
        if config.generation.api_key.is_some() { "set" } else { "none" }
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nFeatures:");
    println!("  Page store: {}", config.features.page_store);

    println!("\nTelemetry:");
    match &config.telemetry.endpoint {
        Some(endpoint) => println!("  Endpoint: {}", endpoint),
        None => println!("  Log only"),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --import mode: inserts a flow document
fn handle_import(config: &Config, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let new_flow: NewFlow = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid flow document", file.display()))?;

    let flows = open_flows(config)?;
    let flow = flows.insert_flow(&new_flow)?;
    let components = flow.website_components();

    println!("✓ Imported flow '{}' ({})", flow.name, flow.id);
    if let Some(endpoint) = &flow.endpoint_name {
        println!("  Endpoint name: {}", endpoint);
    }
    println!("  Website input components: {}", components.len());
    if components.is_empty() {
        tracing::warn!("Flow {} has no website input component and cannot be served", flow.id);
    }

    Ok(())
}

/// Handles the --list-pages mode: prints every component's page store
fn handle_list_pages(config: &Config, identifier: &str) -> anyhow::Result<()> {
    let flows = open_flows(config)?;
    let Some(flow) = flows.resolve_flow(identifier)? else {
        bail!("Website not found: {}", identifier);
    };

    println!("Flow '{}' ({}), version {}\n", flow.name, flow.id, flow.version);
    for component in flow.website_components() {
        println!(
            "{} (use_store: {}, require_link: {}, {} pages)",
            component.id,
            component.use_store,
            component.require_link,
            component.page_store.len()
        );
        for entry in component.page_store.enumerate() {
            println!("  {} ({} bytes)", entry.path, entry.content.len());
        }
    }

    Ok(())
}

/// Handles the --drop-page mode: removes a stored page so it regenerates
fn handle_drop_page(config: &Config, identifier: &str, path: &str) -> anyhow::Result<()> {
    let flows: Arc<dyn FlowRepository> = Arc::new(open_flows(config)?);
    let Some(flow) = flows.resolve_flow(identifier)? else {
        bail!("Website not found: {}", identifier);
    };

    let path = normalize_page_path(path);
    if StoreWriter::new(flows).drop_page(flow.id, &path)? {
        println!("✓ Removed {} from flow '{}'", path, flow.name);
    } else {
        println!("No stored page {} in flow '{}'", path, flow.name);
    }

    Ok(())
}

/// Handles the main serving operation
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let flows: Arc<dyn FlowRepository> = Arc::new(open_flows(&config)?);
    let flow_count = flows.list_flows()?.len();

    let server = PageServer::from_config(&config, flows)?;
    tracing::info!(
        "Serving {} flows, generation via {} (timeout {}s, page store {})",
        flow_count,
        config.generation.endpoint,
        config.generation.timeout_secs,
        if config.features.page_store { "on" } else { "off" }
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(Arc::new(server)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
