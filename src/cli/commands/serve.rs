//! HTTP server command handler

use anyhow::{anyhow, Result};

use crate::adapters::http::{HttpConfig, McpHttpServer};
use crate::domain::models::McpServerConfig;
use crate::services::ContextService;

/// Handle `serve`: run until Ctrl+C, then flush traces.
pub async fn handle_serve(
    service: ContextService,
    servers: Vec<McpServerConfig>,
    config: HttpConfig,
) -> Result<()> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        cors = config.enable_cors,
        "Starting HTTP server"
    );

    let server = McpHttpServer::new(service.clone(), servers, config);
    server
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| anyhow!("HTTP server failed: {e}"))?;

    crate::application::shutdown(&service).await?;
    Ok(())
}
