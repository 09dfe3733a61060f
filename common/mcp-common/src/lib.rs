//! MCP Common - Shared utilities for MCP servers
//!
//! - **Initialization**: [`init_tracing`], [`shutdown_signal`],
//!   [`serve_stdio`] and [`serve_http`] for server startup and clean shutdown
//! - **Results**: helpers for building `CallToolResult` responses
//! - **Errors**: constructors for protocol-level MCP errors
//! - **Embeddable**: [`EmbeddableMcp`] trait for in-process execution
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     mcp_common::init_tracing("my_mcp")?;
//!     mcp_common::serve_stdio(MyServer::new()).await
//! }
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::invalid_params;
pub use init::{
    init_tracing, serve_http, serve_http_on, serve_stdio, shutdown_signal, HTTP_MCP_PATH,
};
pub use result::{json_success, text_error, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
