//! Observability for the GKE MCP server.
//!
//! Structured logging via `tracing`. All output goes to stderr: stdout is
//! reserved for the MCP protocol stream.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, TracingConfig};
