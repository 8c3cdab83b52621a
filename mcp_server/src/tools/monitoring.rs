//! Cloud Monitoring resource discovery.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{non_blank, to_pretty_json, ToolContext, ToolInput};
use crate::error::HandlerError;

pub const LIST_MONITORED_RESOURCE_DESCRIPTORS: &str = "list_monitored_resource_descriptors";

/// Server-side filter selecting Kubernetes resource types.
pub const K8S_RESOURCE_FILTER: &str = r#"resource.type = starts_with("k8s_")"#;

/// Input for listing monitored resource descriptors
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListMonitoredResourceDescriptorsInput {
    /// GCP project ID. Uses the configured default project when empty.
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ToolInput for ListMonitoredResourceDescriptorsInput {}

pub async fn list_monitored_resource_descriptors(
    ctx: ToolContext<'_>,
    input: ListMonitoredResourceDescriptorsInput,
) -> Result<String, HandlerError> {
    let project = ctx.config.project_or_default(non_blank(&input.project_id))?;
    let descriptors = ctx
        .api
        .list_monitored_resource_descriptors(&project, Some(K8S_RESOURCE_FILTER))
        .await?;

    // The filter is applied again locally in case the API ignores it.
    let descriptors: Vec<_> = descriptors
        .into_iter()
        .filter(|d| d.resource_type.starts_with("k8s_"))
        .collect();
    debug!(project = %project, count = descriptors.len(), "Listed monitored resource descriptors");
    to_pretty_json(&descriptors)
}
