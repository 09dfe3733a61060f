//! Server initialization utilities
//!
//! Provides standardized tracing setup plus stdio and streamable HTTP serve
//! loops that stop on SIGINT/SIGTERM.

use std::future::Future;
use std::net::SocketAddr;

use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, tower::StreamableHttpService,
};
use rmcp::transport::StreamableHttpServerConfig;
use rmcp::{ServerHandler, ServiceExt};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging for MCP servers
///
/// Logs go to stderr because stdout carries the MCP protocol. Filtering comes
/// from `RUST_LOG`, with `<crate_name>=info` added as a default directive.
///
/// Set `LOG_FORMAT=json` for structured JSON output.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

/// Resolves once the process receives SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Serve an MCP server over stdio until the client disconnects or a
/// shutdown signal arrives.
///
/// Both outcomes are a clean shutdown; in-flight tool calls are not drained.
///
/// ```rust,ignore
/// mcp_common::init_tracing("my_mcp")?;
/// mcp_common::serve_stdio(MyMcpServer::new()).await?;
/// ```
pub async fn serve_stdio<S>(server: S) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    tokio::select! {
        quit = service.waiting() => {
            quit?;
            tracing::info!("Client disconnected");
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal, exiting...");
        }
    }

    tracing::info!("Server shutting down");
    Ok(())
}

/// Path the streamable HTTP endpoint is mounted under
pub const HTTP_MCP_PATH: &str = "/mcp";

/// Serve an MCP server over streamable HTTP on `addr` until a shutdown
/// signal arrives.
///
/// Each client session gets its own clone of `server`. The endpoint is
/// mounted at [`HTTP_MCP_PATH`].
pub async fn serve_http<S>(server: S, addr: SocketAddr) -> anyhow::Result<()>
where
    S: ServerHandler + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_http_on(server, listener, shutdown_signal()).await
}

/// Serve over streamable HTTP on an already bound listener, stopping when
/// `shutdown` resolves.
pub async fn serve_http_on<S, F>(
    server: S,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    S: ServerHandler + Clone + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let router = axum::Router::new().nest_service(HTTP_MCP_PATH, service);

    tracing::info!(
        "Server listening on http://{}{}",
        listener.local_addr()?,
        HTTP_MCP_PATH
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Received shutdown signal, exiting...");
        })
        .await?;

    tracing::info!("Server shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone)]
    struct PingServer;

    impl ServerHandler for PingServer {}

    fn initialize_request() -> serde_json::Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "init-test", "version": "0.1.0"}
            }
        })
    }

    #[tokio::test]
    async fn test_serve_http_answers_initialize_and_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(serve_http_on(PingServer, listener, async move {
            let _ = stop_rx.await;
        }));

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}{}", addr, HTTP_MCP_PATH))
            .header("Accept", "application/json, text/event-stream")
            .json(&initialize_request())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers().contains_key("mcp-session-id"));
        drop(response);
        drop(client);

        stop_tx.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop after shutdown")
            .unwrap();
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn test_serve_http_rejects_other_paths() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(serve_http_on(PingServer, listener, async move {
            let _ = stop_rx.await;
        }));

        let response = reqwest::Client::new()
            .post(format!("http://{}/rpc", addr))
            .json(&initialize_request())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
