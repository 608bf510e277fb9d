//! HTTP wrapper exposing source operations as JSON.

mod handlers;
mod routes;

pub use routes::create_router;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::scrapers::{ScraperOptions, SourceRegistry};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SourceRegistry>,
    pub options: ScraperOptions,
    /// Include the error chain in 500 responses.
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            registry: Arc::new(config.registry()?),
            options: config.scraper_options()?,
            expose_error_details: config.server.expose_error_details,
        })
    }
}

/// Start the web server. Returns once Ctrl+C is received and in-flight
/// requests have finished.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    serve_until(state, host, port, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    })
    .await
}

/// Start the web server and shut down gracefully when `shutdown` resolves.
pub async fn serve_until<F>(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
