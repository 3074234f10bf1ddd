//! Unified gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                   GATEWAY                     │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//!   ─────────────────┼─▶│   net    │──▶│   http   │──▶│  routing  │  │
//!                    │  │ listener │   │  server  │   │  (ordered)│  │
//!                    │  └──────────┘   └──────────┘   └─────┬─────┘  │
//!                    │                                      │        │      ┌─────────┐
//!                    │                                      ├────────┼─────▶│   api   │
//!                    │                 ┌──────────┐         │        │      ├─────────┤
//!                    │                 │ upstream │◀────────┤────────┼─────▶│   app   │
//!                    │                 │  client  │         │        │      ├─────────┤
//!                    │                 └──────────┘         └────────┼─────▶│  site   │
//!                    │                                               │      └─────────┘
//!                    │  config · lifecycle · observability           │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use unified_gateway::config::loader;
use unified_gateway::lifecycle::startup;
use unified_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "unified-gateway")]
#[command(about = "Single-port gateway for the API, app and site services", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match loader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("unified-gateway: configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("unified-gateway: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("unified-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        api = %config.upstreams.api,
        app = %config.upstreams.app,
        site = %config.upstreams.site,
        "Configuration loaded"
    );

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
