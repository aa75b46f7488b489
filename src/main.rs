//! Frenbet wagering service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use frenbet::api::{create_router, AppState};
use frenbet::config::Config;
use frenbet::coordinator::AppCoordinator;
use frenbet::feed::{ReconciliationFeed, RetryPolicy};
use frenbet::metrics;
use frenbet::store::{ChangeFeed, MemoryStore, MemoryStoreConfig};
use frenbet::utils::shutdown_signal;

/// Frenbet wagering service.
#[derive(Parser, Debug)]
#[command(name = "frenbet")]
#[command(about = "Pari-mutuel wagering service for friendly two-outcome bets")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so RUST_LOG and VERBOSE apply
    let loaded = Config::load();

    // Initialize logging
    let directives = match &loaded {
        Ok(config) => config.log_filter(args.verbose),
        Err(_) => Config::default().log_filter(args.verbose),
    };
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(loaded),
        Some(Command::Serve { port }) => cmd_serve(loaded, port.or(args.port)).await,
        None => cmd_serve(loaded, args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FRENBET - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match loaded {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Log Filter: {}", config.log_filter(false));
    println!("  Public URL: {}", config.base_url());
    println!(
        "  Default Limits: {}% - {}% of first bet",
        config.default_min_bet_percentage, config.default_max_bet_percentage
    );
    println!("  Feed Capacity: {}", config.feed_capacity);
    println!(
        "  Refresh Retries: {} (initial delay {}ms)",
        config.refresh_max_attempts, config.refresh_initial_delay_ms
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP service until a shutdown signal arrives.
async fn cmd_serve(loaded: Result<Config, envy::Error>, port: Option<u16>) -> anyhow::Result<()> {
    let config = loaded?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    let port = port.unwrap_or(config.port);
    let base_url = Url::parse(config.base_url())?;

    // Initialize metrics
    let prometheus = match metrics::install_prometheus() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    };
    metrics::init_metrics();

    let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig {
        feed_capacity: config.feed_capacity,
        ..Default::default()
    }));
    let coordinator = Arc::new(AppCoordinator::new(
        Arc::clone(&store),
        config.default_percentages(),
    ));

    let retry = RetryPolicy::from_config(config.refresh_max_attempts, config.refresh_initial_delay_ms);
    let feed_handle =
        ReconciliationFeed::new(Arc::clone(&coordinator), store.subscribe(), retry).spawn();

    let mut app_state = AppState::new(Arc::clone(&coordinator), base_url);
    if let Some(handle) = prometheus {
        app_state = app_state.with_metrics(handle);
    }

    let router = create_router(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!(
        "Default limits: {}% - {}% of first bet",
        config.default_min_bet_percentage, config.default_max_bet_percentage
    );

    app_state.set_ready(true);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.set_ready(false);
    feed_handle.abort();
    info!("Shutdown complete");

    Ok(())
}
