//! `gke:upgrades-best-practices-risk-report`: how well a cluster follows
//! upgrade best practices.

use std::sync::LazyLock;

use super::template::Template;
use super::{CompiledTemplate, PromptArgumentSpec, PromptSpec};

pub const NAME: &str = "gke:upgrades-best-practices-risk-report";

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
];

const TEMPLATE_TEXT: &str = r#"You are a GKE expert. Assess how well the cluster below follows GKE upgrade best practices and report the risks of the gaps you find.

Cluster name: {{.cluster_name}}
Cluster location: {{.cluster_location}}

Gather configuration with `gcloud container clusters describe {{.cluster_name}} --location {{.cluster_location}}`, `gcloud container node-pools list --cluster {{.cluster_name}} --location {{.cluster_location}}` and `kubectl` against the cluster. Report only what the data shows.

## Best Practices to Check

### Release Channels
Is the cluster enrolled in a release channel? Clusters without one must be upgraded manually and miss automatic security patches.

### Maintenance Windows
Is a maintenance window configured? Are maintenance exclusions in place around critical business periods, and do they respect the maximum allowed duration?

### Pod Disruption Budgets
Do replicated workloads have PodDisruptionBudgets? Flag budgets that allow zero disruptions, since they block node drains during upgrades.

### Node Pool Upgrades
Which upgrade strategy does each node pool use (surge or blue-green)? Are `maxSurge` and `maxUnavailable` appropriate for the pool size and workload tolerance? Is node auto-upgrade enabled?

### Workload Resilience
Do workloads define readiness probes, graceful termination periods and multiple replicas spread across zones?

### Deprecated APIs
Does the cluster use Kubernetes APIs that are removed in upcoming minor versions?

## Report Format
For each best practice: status (Followed, Partially Followed or Not Followed), evidence and risk level.

## Mitigation Recommendations
End the report with prioritized, concrete mitigation recommendations, including the commands or manifest changes needed to close each gap.
"#;

static TEMPLATE: CompiledTemplate = LazyLock::new(|| {
    Template::compile("gke-upgrades-best-practices-risk-report", TEMPLATE_TEXT)
});

pub static PROMPT: PromptSpec = PromptSpec {
    name: NAME,
    description: "Generates a report of risks from gaps in GKE cluster upgrade best practices.",
    result_description: "GKE Cluster Upgrade Best Practices Risk Report Prompt",
    arguments: ARGUMENTS,
    template: &TEMPLATE,
};
