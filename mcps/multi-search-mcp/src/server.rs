//! MCP Server implementation for multi-provider web search

use mcp_common::{
    async_trait, invalid_params, json_success, text_error, text_success, EmbeddableError,
    EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, Env, ProcessEnv, SelectionMode};
use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::registry::{build_registry, ProviderFactory, ProviderSource};

const INSTRUCTIONS: &str = "Web Search MCP Server - searches the web through Google Custom \
     Search or Ollama web search. An engine is picked at random for each request; if it fails \
     or finds nothing, the remaining engines are tried.";

/// The main Web Search MCP Server
#[derive(Clone)]
pub struct MultiSearchMcpServer {
    dispatcher: Arc<Dispatcher>,
    default_count: usize,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchParams {
    /// The search query
    #[schemars(description = "The search query to execute")]
    pub query: String,
    /// Number of results to return
    #[schemars(description = "Number of results to return (default: 10, max: 10)")]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ProviderStatus {
    selection: String,
    providers: Vec<&'static str>,
    default_count: usize,
    max_snippet_length: usize,
    provider_timeout_secs: u64,
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl MultiSearchMcpServer {
    pub fn new(config: &Config, source: Arc<dyn ProviderSource>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::from_config(config, source)),
            default_count: config.search.default_count,
            tool_router: Self::tool_router(),
        }
    }

    /// Build the server with providers detected from the process environment
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::with_env(config, Arc::new(ProcessEnv))
    }

    pub fn with_env(config: &Config, env: Arc<dyn Env>) -> Result<Self, ConfigError> {
        let factory = ProviderFactory::new(config)?;
        let source = build_registry(config, env, factory)?;
        Ok(Self::new(config, source))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ========================================================================
    // Search Tools
    // ========================================================================

    #[tool(
        description = "Search the web using a randomly selected search engine with fallback support. \
                       If the selected engine fails or returns no results, another engine is tried. \
                       Returns formatted results with titles, snippets, and links."
    )]
    async fn web_search(
        &self,
        Parameters(params): Parameters<WebSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.query.trim().is_empty() {
            return Err(invalid_params("query must not be empty"));
        }

        let count = params.count.unwrap_or(self.default_count).max(1);

        match self.dispatcher.handle(&params.query, count).await {
            Ok(text) => Ok(text_success(text)),
            Err(e) => {
                tracing::error!("Search request rejected: {}", e);
                Ok(text_error(e.to_string()))
            }
        }
    }

    #[tool(description = "List the search engines currently available and how one is chosen per request.")]
    async fn list_providers(&self) -> Result<CallToolResult, McpError> {
        let source = self.dispatcher.source();
        let selection = match source.mode() {
            SelectionMode::Random => "random with fallback".to_string(),
            SelectionMode::Fixed(kind) => format!("fixed: {}", kind.as_str()),
        };

        let status = ProviderStatus {
            selection,
            providers: source
                .providers()
                .iter()
                .map(|p| p.kind().label())
                .collect(),
            default_count: self.default_count,
            max_snippet_length: self.dispatcher.max_snippet_length(),
            provider_timeout_secs: self.dispatcher.provider_timeout().as_secs(),
        };

        json_success(&status)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for MultiSearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for MultiSearchMcpServer {
    fn server_name(&self) -> &str {
        "web-search"
    }

    fn server_description(&self) -> Option<&str> {
        Some(INSTRUCTIONS)
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "web_search" => {
                let params: WebSearchParams = serde_json::from_value(params)?;
                self.web_search(Parameters(params)).await.map_err(Into::into)
            }

            "list_providers" => self.list_providers().await.map_err(Into::into),

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
