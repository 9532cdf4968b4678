//! frame-server
//!
//! Serves HTTP under the lifecycle supervisor.
//!
//! # Architecture Overview
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────────┐
//!            │                      Supervisor                          │
//!            │                                                          │
//!  SIGINT ───┼─▶┌──────────┐   first ready   ┌───────────────────────┐  │
//!  SIGHUP ───┼─▶│ signals  │────────────────▶│        race           │  │
//!  SIGTERM ──┼─▶└──────────┘          ┌─────▶│ → ShutdownOutcome     │  │
//!            │                        │      └──────────┬────────────┘  │
//!            │  ┌──────────┐  fatal   │                 │               │
//!            │  │HttpServer│──────────┤      force: close()             │
//!            │  │  run()   │          │      graceful: shutdown(deadline)│
//!            │  └──────────┘          │                                 │
//!            │  ┌──────────┐  fatal   │                                 │
//!            │  │ register │──────────┘                                 │
//!            │  │  hook    │──────────────▶ Registry                    │
//!            │  └──────────┘                                            │
//!            └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use url::Url;

use frame_server::config::{load_config, RegistryKind, ServerConfig};
use frame_server::lifecycle::{LifecycleOptions, Supervisor};
use frame_server::observability::{logging, metrics};
use frame_server::registry::{HttpRegistry, MemoryRegistry, NoopRegistry, Registry, RegistryInfo};
use frame_server::HttpServer;

#[derive(Parser)]
#[command(name = "frame-server")]
#[command(about = "HTTP service with supervised graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("frame-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        exit_wait_timeout_secs = config.lifecycle.exit_wait_timeout_secs,
        registry = ?config.registry.kind,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = HttpServer::bind(&config).await?;
    let local_addr = server.local_addr();

    let mut options = LifecycleOptions::from_config(&config.lifecycle);
    options.registry = build_registry(&config)?;
    options.registry_info = RegistryInfo {
        service_name: config.registry.service_name.clone(),
        addr: config
            .registry
            .advertise_address
            .clone()
            .unwrap_or_else(|| local_addr.to_string()),
        weight: config.registry.weight,
        tags: config.registry.tags.clone(),
    };

    let supervisor = Supervisor::new(Arc::new(server), options);
    match supervisor.spin().await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Forced shutdown");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn build_registry(config: &ServerConfig) -> Result<Arc<dyn Registry>, Box<dyn std::error::Error>> {
    let registry: Arc<dyn Registry> = match config.registry.kind {
        RegistryKind::None => Arc::new(NoopRegistry),
        RegistryKind::Memory => Arc::new(MemoryRegistry::new()),
        RegistryKind::Http => {
            let endpoint = config
                .registry
                .endpoint
                .as_deref()
                .ok_or("registry.endpoint is required for the http registry")?;
            Arc::new(HttpRegistry::new(
                Url::parse(endpoint)?,
                Duration::from_secs(config.registry.timeout_secs),
            )?)
        }
    };
    Ok(registry)
}
