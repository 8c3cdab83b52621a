//! MCP server for Google Kubernetes Engine.
//!
//! Exposes GKE operations to AI agents over the Model Context Protocol:
//!
//! - **Tools**: list and inspect clusters, fetch kubeconfigs, collect node sos
//!   reports, generate inference manifests, list monitored resources and
//!   recommendations, download Cluster Toolkit
//! - **Prompts**: cost analysis, deployment assistance, upgrade risk reports
//!
//! # Architecture
//!
//! Every handler follows the same shape: validate the argument bundle, then
//! either render a compiled template or make one external call (a `gcloud` /
//! `kubectl` / `git` subprocess or a Google Cloud REST request), and wrap the
//! text result. Requests arrive as JSON-RPC 2.0 over stdio.

pub mod error;
pub mod prompts;
pub mod server;
pub mod tools;
pub mod validation;

pub use error::HandlerError;
pub use server::GkeMcpServer;
pub use prompts::{GetPromptResult, PromptDefinitions};
pub use server::{CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, TextContent};
pub use tools::ToolDefinitions;
pub use server::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};

pub use rmcp;
