//! `gke:cost`: answer a cost question from GKE billing data.

use std::sync::LazyLock;

use super::template::Template;
use super::{CompiledTemplate, PromptArgumentSpec, PromptSpec};

pub const NAME: &str = "gke:cost";

const ARGUMENTS: &[PromptArgumentSpec] = &[PromptArgumentSpec {
    name: "user_question",
    description: "The user's question about GKE costs.",
    required: true,
}];

const TEMPLATE_TEXT: &str = r#"You are a GKE cost and optimization expert. Answer the user's question about the cost of their GKE clusters and workloads using the guidance below.

## Data Sources

### GKE Cost Allocation
GKE Cost Allocation attributes cluster costs to Kubernetes namespaces and labels. It must be enabled per cluster:
`gcloud container clusters update CLUSTER_NAME --location=LOCATION --enable-cost-allocation`
Cost Allocation data appears in the Cloud Billing export a few hours after it is enabled. It is not retroactive.

### BigQuery Integration
Detailed cost questions require a Cloud Billing detailed usage cost export to BigQuery.
- Ask the user for the BigQuery project, dataset and table of the export if they have not provided them.
- Never guess table names. Use `bq ls` or the BigQuery console to confirm they exist.
- Filter on `service.description = 'Kubernetes Engine'` and `labels.key` values such as `goog-k8s-cluster-name`, `k8s-namespace` and `k8s-label/*`.
- Always bound queries by `usage_start_time` to limit the bytes scanned.

### Cost Allocation by Namespace Example
```sql
SELECT
  (SELECT value FROM UNNEST(labels) WHERE key = 'k8s-namespace') AS namespace,
  SUM(cost) AS total_cost
FROM `PROJECT.DATASET.TABLE`
WHERE usage_start_time >= TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL 30 DAY)
GROUP BY namespace
ORDER BY total_cost DESC
```

## Optimization Guidance
- Right-size workloads using Vertical Pod Autoscaler recommendations and actual usage.
- Prefer Autopilot or node auto-provisioning for bursty or heterogeneous workloads.
- Use Spot VMs for fault-tolerant batch workloads.
- Review committed use discounts for steady baseline usage.
- Identify idle clusters and node pools that can be scaled down.

## Actionable Steps
1. Restate the user's question and identify the data needed to answer it.
2. Check whether GKE Cost Allocation and the BigQuery export are available. Explain how to enable them if not.
3. Provide the exact queries or commands to run, with placeholders clearly marked.
4. Summarize findings and recommend concrete next steps, ordered by expected savings.

## User Question
{{.user_question}}
"#;

static TEMPLATE: CompiledTemplate = LazyLock::new(|| Template::compile("gke-cost", TEMPLATE_TEXT));

pub static PROMPT: PromptSpec = PromptSpec {
    name: NAME,
    description: "Answer natural language questions about GKE-related costs by leveraging Cloud Billing BigQuery exports.",
    result_description: "GKE Cost Analysis Prompt",
    arguments: ARGUMENTS,
    template: &TEMPLATE,
};
