//! `gke_deploy`: the deploy prompt exposed as a tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ToolInput;
use crate::error::HandlerError;
use crate::prompts;
use crate::validation::Phrasing;

pub const GKE_DEPLOY: &str = "gke_deploy";

/// Input for the deploy assistant
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GkeDeployInput {
    /// A natural language request specifying the configuration file to deploy. e.g. 'my-app.yaml to staging'
    pub user_request: String,
}

impl ToolInput for GkeDeployInput {
    const PHRASING: Phrasing = Phrasing::Quoted;

    const REQUIRED: &'static [&'static str] = &["user_request"];
}

pub fn gke_deploy(input: GkeDeployInput) -> Result<String, HandlerError> {
    prompts::deploy::render(&input.user_request)
}
