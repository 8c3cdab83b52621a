//! Configuration provider for the GKE MCP server.
//!
//! Resolves the effective default project and location from the local gcloud
//! configuration once at startup, plus the user agent sent to Google APIs.
//! The resulting [`Config`] is read-only and shared by every handler.

pub mod config;
pub mod error;

pub use config::{Config, USER_AGENT_PREFIX};
pub use error::{ConfigError, Result};
