//! Response Header Manager
//!
//! Serves content through the response header middleware.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ TraceLayer ─▶ TimeoutLayer ─▶ response headers ─▶ static files / 200 OK
//!                                                   │        ▲
//!                                                   │        │ snapshot
//!                                            reload check    │
//!                                                   ▼        │
//!                                          ReloadSupervisor ─┴─▶ RuleRegistry (ArcSwap)
//!                                                   │
//!                                                   ▼
//!                                          rules file (TOML)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use response_header_manager::config::{FilterConfig, ReloadMode, ServerConfig};
use response_header_manager::lifecycle::{initialize, signals, Shutdown};
use response_header_manager::observability::{logging, metrics};
use response_header_manager::processing::ProcessorRegistry;
use response_header_manager::reload::ReloadPoller;
use response_header_manager::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "response-header-manager")]
#[command(about = "Serve content with response headers set from declarative rules", long_about = None)]
struct Args {
    /// Rules file (TOML)
    #[arg(short, long, default_value = "response-headers.toml")]
    config: PathBuf,

    /// Seconds between rules file checks; 0 or less disables reloading
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    reload_interval: i64,

    /// Where reload checks run
    #[arg(long, value_enum, default_value_t = ReloadMode::Inline)]
    reload_mode: ReloadMode,

    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Directory to serve; a plain 200 response is used if omitted
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Prometheus metrics endpoint (disabled if omitted)
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_logging(args.log_level.as_deref());

    tracing::info!("response-header-manager v{} starting", env!("CARGO_PKG_VERSION"));

    let filter_config = FilterConfig {
        config_file: args.config,
        reload_check_interval_secs: args.reload_interval,
        reload_mode: args.reload_mode,
    };
    let server_config = ServerConfig {
        bind_address: args.bind,
        static_root: args.root,
        request_timeout_secs: args.timeout,
    };

    // Refuse to start without a valid rules file.
    let manager = initialize(&filter_config, ProcessorRegistry::new())?;

    if let Some(addr) = args.metrics_address {
        metrics::init_metrics(addr);
    }

    let shutdown = Shutdown::new();

    if filter_config.reload_mode == ReloadMode::Background {
        let poller = ReloadPoller::new(manager.supervisor().clone());
        tokio::spawn(poller.run(shutdown.subscribe()));
    }
    signals::spawn_reload_on_hangup(manager.supervisor().clone());

    let listener = TcpListener::bind(&server_config.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(server_config, manager);
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::wait_for_shutdown().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
