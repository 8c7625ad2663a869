use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use h2_dispatch::config::{self, ServerConfig};
use h2_dispatch::lifecycle::{signals, Application, Shutdown};
use h2_dispatch::observability;

/// HTTP/2 server dispatching requests through a pluggable handler chain.
#[derive(Debug, Parser)]
#[command(name = "h2-dispatch", version, about)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Validate the configuration, build the handler chain and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => match config::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("h2-dispatch: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    if let Err(e) = observability::init_logging(&config.observability) {
        eprintln!("h2-dispatch: cannot initialize logging: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "h2-dispatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        tls = config.listener.tls.is_some(),
        root = %config.paths.root.display(),
        plugins = config.plugins.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled && !cli.check {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = observability::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = match Application::build(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, cause = ?std::error::Error::source(&e), "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        let ids: Vec<_> = app.dispatcher().chain().ids().map(str::to_string).collect();
        println!("configuration OK; handler chain: {}", ids.join(" → "));
        return ExitCode::SUCCESS;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = app.serve(shutdown.subscribe()).await {
        tracing::error!(error = %e, cause = ?std::error::Error::source(&e), "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
