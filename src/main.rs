//! Notes service
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                NOTES SERVICE                  │
//!                       │                                               │
//!   POST /notes         │  ┌────────┐   ┌─────────┐   ┌──────────────┐  │
//!   DELETE /notes/{id}  ├─▶│  http  │──▶│  auth   │──▶│ NotesService │  │
//!   GET /notes          │  │ server │   │ (token) │   └──────┬───────┘  │
//!                       │  └────────┘   └─────────┘          │          │
//!                       │                       ┌────────────┼───────┐  │
//!                       │                       ▼            ▼       │  │
//!                       │               ┌────────────┐ ┌──────────┐  │  │
//!                       │               │ rate_limit │ │  store   │  │  │
//!                       │               └────────────┘ └──────────┘  │  │
//!                       │                                             │  │
//!                       │  config · observability · lifecycle         │  │
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use notes_service::config::{load_config, NotesConfig};
use notes_service::lifecycle::{init_services, signals, Shutdown};
use notes_service::observability::{logging, metrics};
use notes_service::HttpServer;

#[derive(Parser)]
#[command(name = "notes-service")]
#[command(about = "Backend for sharing short notes", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => NotesConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("notes-service v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        users = config.auth.users.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let services = init_services(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, &services);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
