//! Toomore Photos server and catalog sync.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toomore_photos::api::{create_router, AppState};
use toomore_photos::config::{load_tags, Config};
use toomore_photos::storage::{PgRepository, PhotoRepository};
use toomore_photos::upstream::FlickrClient;
use toomore_photos::{cache, run_sync, spawn_cleanup_task, Gallery};

#[derive(Debug, Parser)]
#[command(name = "toomore_photos", version, about = "Personal photo gallery over the Flickr API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the gallery over HTTP (default)
    Serve,
    /// Walk the whole catalog into the database once, then exit
    Sync,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toomore_photos=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.validate()?;

    let flickr = FlickrClient::new(
        &config.api_key,
        &config.api_secret,
        &config.auth_token,
        &config.user_id,
    )?;
    let repository = match &config.database_url {
        Some(url) => Some(
            PgRepository::connect(url)
                .await
                .context("connecting to DATABASE_URL")?,
        ),
        None => None,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, flickr, repository).await,
        Command::Sync => {
            let report = run_sync(
                &flickr,
                repository.as_ref().map(|r| r as &dyn PhotoRepository),
                config.sync_rate_per_sec,
            )
            .await?;
            info!(
                "Sync report: total={}, succeeded={}, failed={}",
                report.total, report.succeeded, report.failed
            );
            Ok(())
        }
    }
}

async fn serve(
    config: Config,
    flickr: FlickrClient,
    repository: Option<PgRepository>,
) -> anyhow::Result<()> {
    info!("Starting Toomore Photos");

    let tags = load_tags(&config.tags_file)
        .with_context(|| format!("loading tags from {}", config.tags_file))?;
    info!(
        "Configuration loaded: tags={}, tag_mode={}, port={}, cleanup_interval={}s",
        tags.len(),
        config.tag_mode,
        config.server_port,
        config.cleanup_interval
    );

    let cache = cache::connect(config.redis_url.as_deref()).await;
    let mut gallery = Gallery::from_config(&config, Arc::new(flickr), cache.clone(), tags);
    if let Some(repository) = repository {
        gallery = gallery.with_repository(Arc::new(repository));
    }

    let cleanup_handle = spawn_cleanup_task(cache, config.cleanup_interval);
    let app = create_router(AppState::new(gallery));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the sweep task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cache sweep task aborted");
}
