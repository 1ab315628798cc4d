use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use storefront_edge::config::{Config, LoggingConfig};
use storefront_edge::{AppState, build_router};

/// Storefront edge gateway
#[derive(Debug, Parser)]
#[command(name = "storefront-edge", version, about)]
struct Args {
    /// Path to config.toml (defaults to conf/config.toml or ./config.toml)
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<String>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _guard = init_logging(&config.logging)?;

    tracing::info!(
        "Locales {:?} (default: {}, prefix: {:?})",
        config.locale.locales,
        config.locale.default_locale,
        config.locale.prefix
    );
    if config.auth.enabled() {
        tracing::info!("Session refresh via {}", config.auth.url);
    }
    if config.upstream.url.is_empty() {
        tracing::warn!("upstream.url not set: serving placeholder pages");
    } else {
        tracing::info!("Proxying pages to {}", config.upstream.url);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Storefront edge listening on http://{}", addr);
    tracing::info!("API docs at http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Storefront edge stopped");
    Ok(())
}

/// Console logging always; daily-rolling file logging when configured.
/// The returned guard must live as long as the process.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.file {
        Some(file) => {
            let path = std::path::Path::new(file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("storefront-edge.log");
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        },
        None => {
            registry.init();
            Ok(None)
        },
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
