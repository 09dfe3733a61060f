//! Multi-provider Web Search MCP Library
//!
//! Exposes one `web_search` tool backed by Google Custom Search and Ollama
//! web search. Each request shuffles the usable engines and falls back
//! through them until one returns results.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use multi_search_mcp::{Config, MultiSearchMcpServer};
//!
//! let config = Config::load()?;
//! let server = MultiSearchMcpServer::from_config(&config)?;
//! let text = server.dispatcher().handle("rust ownership", 3).await?;
//! ```
//!
//! # Configuration
//! - `GOOGLE_API_KEY` + `GOOGLE_SEARCH_ENGINE_ID` enable Google
//! - `OLLAMA_API_KEY` (optional) selects hosted Ollama; without it a local
//!   instance is used
//! - `MAX_SNIPPET_LENGTH`, `PROVIDER_TIMEOUT_SECS`, `SEARCH_PROVIDER`
//! - `MCP_TRANSPORT` (`stdio` or `http`) and `MCP_BIND_ADDR` for the
//!   streamable HTTP endpoint at `/mcp`
//! - optional TOML at `WEB_SEARCH_CONFIG_PATH` or `~/.binks/web-search.toml`

pub mod backends;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod registry;
pub mod server;
pub mod types;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{BackendError, ConfigError, SearchError};
pub use server::{MultiSearchMcpServer, WebSearchParams};
pub use types::{ProviderKind, SearchResult};
