//! MCP transport layer for stdio and streamable HTTP.

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;

use super::server::Gpt5McpServer;

/// Serves MCP over stdin/stdout until the client disconnects.
///
/// # Errors
///
/// Fails if the initialize handshake fails or the session ends abnormally.
pub async fn serve_stdio(server: Gpt5McpServer) -> anyhow::Result<()> {
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Serves MCP over streamable HTTP at `http://{host}:{port}/mcp` until
/// Ctrl-C.
///
/// Each session gets a clone of `server`; clones share the pipeline.
///
/// # Errors
///
/// Fails if the address cannot be bound or the HTTP server stops with an
/// error.
#[cfg(feature = "http")]
pub async fn serve_http(server: Gpt5McpServer, host: &str, port: u16) -> anyhow::Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };
    use std::sync::Arc;

    let shutdown = tokio_util::sync::CancellationToken::new();

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: shutdown.child_token(),
            ..Default::default()
        },
    );

    let app = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let local = listener.local_addr()?;

    tracing::info!(url = %format!("http://{local}/mcp"), "MCP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
