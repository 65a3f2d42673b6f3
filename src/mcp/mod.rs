//! MCP (Model Context Protocol) Module
//!
//! Provides JSON-RPC 2.0 over stdio and over HTTP/SSE.

pub mod content;
pub mod handlers;
pub mod prompts;
pub mod resources;
pub mod rpc;
pub mod service;
pub mod stdio;
pub mod tools;

pub use handlers::{config, McpState};
pub use service::McpService;
