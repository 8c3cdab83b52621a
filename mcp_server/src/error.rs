//! Handler error type.

use thiserror::Error;

use cloud_interface::CloudError;
use gke_config::ConfigError;

use crate::prompts::template::TemplateError;
use crate::server::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::validation::{missing_message, Phrasing};

/// Failure of a single tool call or prompt request.
///
/// Every variant is reported to the client as the request's error; nothing
/// is retried.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A required argument was absent, empty or whitespace-only.
    #[error("{}", missing_message(.field, .phrasing))]
    MissingArgument { field: String, phrasing: Phrasing },

    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Non-zero exit or API error; the external message is passed through.
    #[error(transparent)]
    ExternalCommand(#[from] CloudError),

    #[error("failed to execute prompt template: {0}")]
    Template(#[from] TemplateError),

    #[error("failed to build kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),
}

impl HandlerError {
    pub fn missing(field: impl Into<String>, phrasing: Phrasing) -> Self {
        Self::MissingArgument {
            field: field.into(),
            phrasing,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// JSON-RPC error code reported for this failure.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            Self::MissingArgument { .. }
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::UnknownPrompt(_) => INVALID_PARAMS,
            Self::UnknownTool(_) => METHOD_NOT_FOUND,
            Self::ExternalCommand(_) | Self::Template(_) | Self::Kubeconfig(_) | Self::Io(_) => {
                INTERNAL_ERROR
            }
        }
    }
}
