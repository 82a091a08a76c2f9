use std::net::SocketAddr;

use anyhow::Context;
use fridge_backend::{app, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    utils::logging::init_logging();

    let cfg = utils::config::ServerConfig::from_env()?;
    let addr: SocketAddr = cfg.addr;
    let app = app::build_app(&cfg)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {} failed", addr))?;
    tracing::info!("Axum listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
