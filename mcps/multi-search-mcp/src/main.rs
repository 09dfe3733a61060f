//! Web Search MCP Server
//!
//! Serves the `web_search` tool over stdio (default) or streamable HTTP
//! (`MCP_TRANSPORT=http`), load-balancing across Google Custom Search and
//! Ollama web search.

use multi_search_mcp::config::Transport;
use multi_search_mcp::{Config, MultiSearchMcpServer, SearchError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mcp_common::init_tracing("multi_search_mcp")?;

    tracing::info!("Starting Web Search MCP Server");

    let config = Config::load()?;
    let server = MultiSearchMcpServer::from_config(&config)?;

    let providers = server.dispatcher().source().providers();
    if providers.is_empty() {
        tracing::error!("No search engines configured. Please set up at least one of:");
        tracing::error!("  - GOOGLE_API_KEY and GOOGLE_SEARCH_ENGINE_ID for Google Custom Search");
        tracing::error!("  - OLLAMA_API_KEY for Ollama search (or run a local Ollama instance)");
        return Err(SearchError::NoProvidersConfigured.into());
    }

    tracing::info!(
        "Detected {} available search engine(s):",
        providers.len()
    );
    for provider in &providers {
        tracing::info!("  - {}", provider.kind());
    }
    tracing::info!(
        "Max snippet length: {}, provider timeout: {}s",
        config.search.max_snippet_length,
        config.search.provider_timeout_secs
    );
    tracing::info!("Transport: {:?}", config.server.transport);

    match config.server.transport {
        Transport::Stdio => mcp_common::serve_stdio(server).await,
        Transport::Http => {
            let addr = config.bind_addr()?;
            mcp_common::serve_http(server, addr).await
        }
    }
}
