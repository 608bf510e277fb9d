//! Web server command.

use console::style;

use novelscrape::config::Config;
use novelscrape::server::{self, AppState};

/// Start the HTTP API server.
pub async fn cmd_serve(
    config: &Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = AppState::new(config)?;
    let access = state.options.page_access.clone();

    println!(
        "{} Starting novelscrape server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    let result = server::serve(state, &host, port).await;

    if let Some(access) = access {
        if let Err(e) = access.close().await {
            eprintln!("{} Failed to close page access: {}", style("!").yellow(), e);
        }
    }
    result
}
