//! `gke:upgrade-risk-report`: risks of upgrading one cluster to a target version.

use std::sync::LazyLock;

use super::template::Template;
use super::{CompiledTemplate, PromptArgumentSpec, PromptSpec};

pub const NAME: &str = "gke:upgrade-risk-report";

const ARGUMENTS: &[PromptArgumentSpec] = &[
    PromptArgumentSpec {
        name: "cluster_name",
        description: "Name of the GKE cluster to analyze.",
        required: true,
    },
    PromptArgumentSpec {
        name: "cluster_location",
        description: "Location (region or zone) of the cluster.",
        required: true,
    },
    PromptArgumentSpec {
        name: "target_version",
        description: "Target GKE version. When empty, the next available version in the cluster's release channel is used.",
        required: false,
    },
];

const TEMPLATE_TEXT: &str = r#"You are a GKE expert. Produce an upgrade risk report for the cluster described below. Base every finding on data you gather from the cluster and from GKE release notes; do not speculate.

## Input Parameters
- Cluster name: {{.cluster_name}}
- Cluster location: {{.cluster_location}}
- Target version: {{.target_version}}

If the target version is empty, determine it from the cluster's release channel with `gcloud container get-server-config --location {{.cluster_location}}` and use the next available control plane version.

## Data Collection
1. Describe the cluster with `gcloud container clusters describe {{.cluster_name}} --location {{.cluster_location}}` and record the current control plane and node pool versions.
2. Read the GKE release notes and the Kubernetes changelogs for every minor version between the current and target version.
3. List deprecated API usage with the cluster's deprecation insights and recommendations.
4. Inventory workloads, admission webhooks, CRDs and add-ons that depend on version-specific behavior.

## Risk Identification
For every change between the current and target version, decide whether it affects this cluster. Consider:
- Removed or deprecated Kubernetes APIs still in use.
- Behavior changes in kubelet, container runtime, networking or storage drivers.
- Changes to GKE-managed components and default settings.
- Node image changes that affect privileged or host-level workloads.

Only report risks that apply to this cluster. For each risk record the evidence that links it to the cluster.

## Report Format
Produce a Markdown report with:
1. **Summary**: current version, target version and an overall risk rating (Low, Medium or High).
2. **Risks**: one entry per risk with title, severity, affected resources, evidence and mitigation steps.
3. **Pre-upgrade Checklist**: ordered actions to complete before upgrading.
4. **Rollback Considerations**: what can and cannot be rolled back after the upgrade.
"#;

static TEMPLATE: CompiledTemplate =
    LazyLock::new(|| Template::compile("gke-upgrade-risk-report", TEMPLATE_TEXT));

pub static PROMPT: PromptSpec = PromptSpec {
    name: NAME,
    description: "Generates a report of risks for upgrading a GKE cluster to a target version.",
    result_description: "GKE Cluster Upgrade Risk Report Prompt",
    arguments: ARGUMENTS,
    template: &TEMPLATE,
};
