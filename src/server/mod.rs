// src/server/mod.rs

//! HTTP serving layer over the orchestrator.
//!
//! - `POST /api/crawler/start` with a [`LaunchRequest`](crate::types::LaunchRequest) body
//! - `POST /api/crawler/stop`
//! - `GET  /api/crawler/status`
//!
//! Responses allow any origin so a desktop front end can call the API.

pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::ServerSection;
use crate::engine::Orchestrator;
use crate::errors::Result;
use crate::exec::ProcessLauncher;

pub use routes::create_router;

/// Serve the crawler API until `shutdown` resolves, then stop the crawler.
pub async fn serve<L, F>(
    orchestrator: Arc<Orchestrator<L>>,
    server: &ServerSection,
    shutdown: F,
) -> Result<()>
where
    L: ProcessLauncher + 'static,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    // Host names are resolved by the bind; IPv6 literals need no brackets.
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("binding HTTP listener on {}:{}", server.host, server.port))?;

    let addr = listener.local_addr().context("reading bound listener address")?;
    info!(%addr, "crawler API listening");

    let app = create_router(Arc::clone(&orchestrator));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving crawler API")?;

    info!("HTTP server stopped; shutting down crawler");
    orchestrator.shutdown().await;

    Ok(())
}
