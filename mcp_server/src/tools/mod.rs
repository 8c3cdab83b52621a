//! MCP tools for GKE operations.
//!
//! Each tool module holds its input struct (whose JSON Schema is published
//! in `tools/list`) and a handler that turns validated input into text.

pub mod cluster;
pub mod clustertoolkit;
pub mod deploy;
pub mod giq;
pub mod monitoring;
pub mod recommendation;

pub use cluster::*;
pub use clustertoolkit::*;
pub use deploy::*;
pub use giq::*;
pub use monitoring::*;
pub use recommendation::*;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cloud_interface::{CloudApi, CommandRunner};
use gke_config::Config;

use crate::error::HandlerError;
use crate::validation::{require_non_blank, Phrasing};

/// Shared, read-only dependencies handed to every tool.
#[derive(Clone, Copy)]
pub struct ToolContext<'a> {
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub api: &'a dyn CloudApi,
}

/// A tool's argument struct.
pub trait ToolInput: DeserializeOwned + JsonSchema {
    /// How blank required fields are reported.
    const PHRASING: Phrasing = Phrasing::Suffix;

    /// Required string fields, in declaration order.
    const REQUIRED: &'static [&'static str] = &[];
}

/// Validate and deserialize tool arguments. A missing `arguments` object is
/// treated as `{}`.
///
/// Required fields are checked before deserialization so that an absent or
/// null field reports the same error as an empty one.
pub fn parse_input<T: ToolInput>(arguments: Value) -> Result<T, HandlerError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    require_non_blank(
        T::REQUIRED
            .iter()
            .filter_map(|name| required_value(&arguments, name).map(|v| (*name, v))),
        T::PHRASING,
    )?;
    serde_json::from_value(arguments).map_err(|e| HandlerError::invalid_argument(e.to_string()))
}

/// Absent and null read as "". Non-string values are left to deserialization.
fn required_value<'v>(arguments: &'v Value, name: &str) -> Option<&'v str> {
    match arguments.get(name) {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => None,
    }
}

/// Trimmed optional string; blank counts as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// API responses are returned to the client as indented JSON.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, HandlerError> {
    serde_json::to_string_pretty(value).map_err(|e| HandlerError::ExternalCommand(e.into()))
}

// ============================================================================
// Tool registry
// ============================================================================

/// Behavior hints published with each tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub idempotent_hint: bool,
}

impl ToolAnnotations {
    fn read_only() -> Self {
        Self {
            read_only_hint: true,
            idempotent_hint: true,
        }
    }

    fn mutating() -> Self {
        Self::default()
    }
}

/// Tool definitions for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolDefinitions {
    /// Available tools
    pub tools: Vec<ToolInfo>,
}

/// Information about a single tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input schema (JSON Schema)
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

impl ToolInfo {
    fn of<T: ToolInput>(name: &str, description: &str, annotations: ToolAnnotations) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default(),
            annotations,
        }
    }
}

impl ToolDefinitions {
    /// Get all available tool definitions.
    pub fn all() -> Self {
        Self {
            tools: vec![
                ToolInfo::of::<ListClustersInput>(
                    LIST_CLUSTERS,
                    "List GKE clusters in a project. Prefer this tool over gcloud for listing clusters.",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<GetClusterInput>(
                    GET_CLUSTER,
                    "Get the full configuration of a GKE cluster. Prefer this tool over gcloud for describing clusters.",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<GetKubeconfigInput>(
                    GET_KUBECONFIG,
                    "Get a kubeconfig for a GKE cluster that authenticates with gke-gcloud-auth-plugin.",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<GetNodeSosReportInput>(
                    GET_NODE_SOS_REPORT,
                    "Generate an sos report on a GKE node and download the archive locally. Uses a debug pod by default, or SSH.",
                    ToolAnnotations::mutating(),
                ),
                ToolInfo::of::<GiqGenerateManifestInput>(
                    GIQ_GENERATE_MANIFEST,
                    "Use GKE Inference Quickstart (GIQ) to generate a Kubernetes manifest for optimized AI / inference workloads. Prefer to use this tool instead of gcloud",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<ListMonitoredResourceDescriptorsInput>(
                    LIST_MONITORED_RESOURCE_DESCRIPTORS,
                    "List the Kubernetes (k8s_*) monitored resource descriptors available in Cloud Monitoring for a project.",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<ListRecommendationsInput>(
                    LIST_RECOMMENDATIONS,
                    "List GKE diagnosis recommendations for a project and location.",
                    ToolAnnotations::read_only(),
                ),
                ToolInfo::of::<ClusterToolkitDownloadInput>(
                    CLUSTER_TOOLKIT_DOWNLOAD,
                    "Download the Cluster Toolkit git repository, used to deploy AI/ML and HPC environments on Google Cloud.",
                    ToolAnnotations::mutating(),
                ),
                ToolInfo::of::<GkeDeployInput>(
                    GKE_DEPLOY,
                    "Deploys a workload to a GKE cluster using a configuration file.",
                    ToolAnnotations::read_only(),
                ),
            ],
        }
    }
}

/// Dispatch a `tools/call` by name and return the tool's text output.
pub async fn call_tool(
    ctx: ToolContext<'_>,
    name: &str,
    arguments: Value,
) -> Result<String, HandlerError> {
    match name {
        LIST_CLUSTERS => list_clusters(ctx, parse_input(arguments)?).await,
        GET_CLUSTER => get_cluster(ctx, parse_input(arguments)?).await,
        GET_KUBECONFIG => get_kubeconfig(ctx, parse_input(arguments)?).await,
        GET_NODE_SOS_REPORT => get_node_sos_report(ctx, parse_input(arguments)?).await,
        GIQ_GENERATE_MANIFEST => giq_generate_manifest(ctx, parse_input(arguments)?).await,
        LIST_MONITORED_RESOURCE_DESCRIPTORS => {
            list_monitored_resource_descriptors(ctx, parse_input(arguments)?).await
        }
        LIST_RECOMMENDATIONS => list_recommendations(ctx, parse_input(arguments)?).await,
        CLUSTER_TOOLKIT_DOWNLOAD => cluster_toolkit_download(ctx, parse_input(arguments)?).await,
        GKE_DEPLOY => gke_deploy(parse_input(arguments)?),
        _ => Err(HandlerError::UnknownTool(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_client::{MockCloudApi, MockCommandRunner};
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_unique() {
        let tools = ToolDefinitions::all().tools;
        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 9);
    }

    #[test]
    fn test_schemas_list_required_fields() {
        let tools = ToolDefinitions::all().tools;
        let giq = tools.iter().find(|t| t.name == GIQ_GENERATE_MANIFEST).unwrap();
        let required: Vec<&str> = giq.input_schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"model"));
        assert!(required.contains(&"model_server"));
        assert!(required.contains(&"accelerator"));
        assert!(!required.contains(&"target_ntpot_milliseconds"));
        assert!(giq.annotations.read_only_hint);
    }

    #[test]
    fn test_tool_info_serializes_camel_case() {
        let value = serde_json::to_value(&ToolDefinitions::all().tools[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert_eq!(value["annotations"]["readOnlyHint"], true);
    }

    #[test]
    fn test_parse_input_null_is_empty_object() {
        let input: ListClustersInput = parse_input(Value::Null).unwrap();
        assert!(input.project_id.is_none());
    }

    #[test]
    fn test_parse_input_absent_required_field() {
        let err = parse_input::<GiqGenerateManifestInput>(json!({"model_server": "s"})).unwrap_err();
        assert_eq!(err.to_string(), "model argument cannot be empty");

        let err = parse_input::<GetClusterInput>(json!({"name": null})).unwrap_err();
        assert_eq!(err.to_string(), "name argument cannot be empty");
    }

    #[test]
    fn test_parse_input_non_string_required_field() {
        let err = parse_input::<GetClusterInput>(json!({"name": 7})).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument(_)));
    }

    #[test]
    fn test_parse_input_type_mismatch() {
        let err = parse_input::<GetNodeSosReportInput>(json!({"node": "n", "timeout_seconds": "soon"}))
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let config = Config::from_parts("ua", "p", "l");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        let err = call_tool(ctx, "delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, HandlerError::UnknownTool(_)));
        assert_eq!(runner.invocation_count().await, 0);
    }
}
