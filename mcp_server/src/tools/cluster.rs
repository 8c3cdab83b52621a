//! Cluster tools: list, describe, kubeconfig and node sos reports.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use cloud_interface::{Cluster, Invocation, Program};

use super::{non_blank, to_pretty_json, ToolContext, ToolInput};
use crate::error::HandlerError;

pub const LIST_CLUSTERS: &str = "list_clusters";
pub const GET_CLUSTER: &str = "get_cluster";
pub const GET_KUBECONFIG: &str = "get_kubeconfig";
pub const GET_NODE_SOS_REPORT: &str = "get_node_sos_report";

/// Location wildcard understood by the Container API.
const ALL_LOCATIONS: &str = "-";

pub const DEFAULT_SOS_DESTINATION: &str = "/tmp/sos-reports";
pub const DEFAULT_SOS_TIMEOUT_SECONDS: u64 = 180;

/// Runs on the node: writes the newest archive to stdout, then removes it.
const SOS_SCRIPT: &str = r#"sos report --batch --quiet --tmp-dir /var/tmp >/dev/null 2>&1 && f=$(ls -t /var/tmp/sosreport-*.tar.xz | head -n 1) && cat "$f" && rm -f "$f" "$f.sha256""#;

const SOS_POD_IMAGE: &str = "busybox";
const SOS_CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

static SOS_POD_SEQUENCE: AtomicU32 = AtomicU32::new(0);

// ============================================================================
// Inputs
// ============================================================================

/// Input for listing clusters
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListClustersInput {
    /// GCP project ID. Uses the configured default project when empty.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Region or zone, or "-" for all locations. Uses the configured default location when empty, otherwise "-".
    #[serde(default)]
    pub location: Option<String>,
}

impl ToolInput for ListClustersInput {}

/// Input for getting one cluster
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetClusterInput {
    /// GCP project ID. Uses the configured default project when empty.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Region or zone of the cluster. Uses the configured default location when empty.
    #[serde(default)]
    pub location: Option<String>,
    /// Cluster name
    pub name: String,
}

impl ToolInput for GetClusterInput {
    const REQUIRED: &'static [&'static str] = &["name"];
}

/// Input for getting a cluster kubeconfig
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetKubeconfigInput {
    /// GCP project ID. Uses the configured default project when empty.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Region or zone of the cluster. Uses the configured default location when empty.
    #[serde(default)]
    pub location: Option<String>,
    /// Cluster name
    pub name: String,
}

impl ToolInput for GetKubeconfigInput {
    const REQUIRED: &'static [&'static str] = &["name"];
}

/// Input for collecting an sos report from a node
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetNodeSosReportInput {
    /// Kubernetes node name
    pub node: String,
    /// Local directory the archive is written to. Defaults to /tmp/sos-reports.
    #[serde(default)]
    pub destination: Option<String>,
    /// How to reach the node: "pod" (privileged pod on the node, default) or "ssh" (gcloud compute ssh).
    #[serde(default)]
    pub method: Option<String>,
    /// Maximum run time in seconds. Defaults to 180.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ToolInput for GetNodeSosReportInput {
    const REQUIRED: &'static [&'static str] = &["node"];
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_clusters(
    ctx: ToolContext<'_>,
    input: ListClustersInput,
) -> Result<String, HandlerError> {
    let project = ctx.config.project_or_default(non_blank(&input.project_id))?;
    let location = ctx
        .config
        .location_or_default(non_blank(&input.location))
        .unwrap_or_else(|_| ALL_LOCATIONS.to_string());

    let response = ctx.api.list_clusters(&project, &location).await?;
    debug!(project = %project, location = %location, count = response.clusters.len(), "Listed clusters");
    to_pretty_json(&response)
}

pub async fn get_cluster(
    ctx: ToolContext<'_>,
    input: GetClusterInput,
) -> Result<String, HandlerError> {
    let fetched = fetch_cluster(ctx, &input.project_id, &input.location, &input.name).await?;
    to_pretty_json(&fetched.cluster)
}

pub async fn get_kubeconfig(
    ctx: ToolContext<'_>,
    input: GetKubeconfigInput,
) -> Result<String, HandlerError> {
    let fetched = fetch_cluster(ctx, &input.project_id, &input.location, &input.name).await?;
    let kubeconfig = Kubeconfig::for_cluster(&fetched.project, &fetched.location, &fetched.cluster)?;
    serde_yaml_ng::to_string(&kubeconfig).map_err(|e| HandlerError::Kubeconfig(e.to_string()))
}

/// A cluster together with the project and location it was looked up in.
struct FetchedCluster {
    project: String,
    location: String,
    cluster: Cluster,
}

async fn fetch_cluster(
    ctx: ToolContext<'_>,
    project_id: &Option<String>,
    location: &Option<String>,
    name: &str,
) -> Result<FetchedCluster, HandlerError> {
    let project = ctx.config.project_or_default(non_blank(project_id))?;
    let location = ctx.config.location_or_default(non_blank(location))?;
    let cluster = ctx.api.get_cluster(&project, &location, name.trim()).await?;
    Ok(FetchedCluster {
        project,
        location,
        cluster,
    })
}

// ============================================================================
// Kubeconfig
// ============================================================================

const KUBECONFIG_API_VERSION: &str = "v1";
const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
const AUTH_PLUGIN: &str = "gke-gcloud-auth-plugin";
const AUTH_PLUGIN_INSTALL_HINT: &str = "Install gke-gcloud-auth-plugin for use with kubectl by following https://cloud.google.com/kubernetes-engine/docs/how-to/cluster-access-for-kubectl#install_plugin";

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    kind: &'static str,
    clusters: Vec<NamedCluster>,
    contexts: Vec<NamedContext>,
    current_context: String,
    users: Vec<NamedUser>,
}

#[derive(Debug, Serialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    certificate_authority_data: String,
    server: String,
}

#[derive(Debug, Serialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Serialize)]
struct ContextEntry {
    cluster: String,
    user: String,
}

#[derive(Debug, Serialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Serialize)]
struct UserEntry {
    exec: ExecConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecConfig {
    api_version: &'static str,
    command: &'static str,
    install_hint: &'static str,
    provide_cluster_info: bool,
}

impl Kubeconfig {
    /// One cluster, context and user, all named `gke_{project}_{location}_{cluster}`
    /// like `gcloud container clusters get-credentials`.
    fn for_cluster(project: &str, location: &str, cluster: &Cluster) -> Result<Self, HandlerError> {
        if cluster.endpoint.is_empty() {
            return Err(HandlerError::Kubeconfig(format!(
                "cluster {} has no endpoint",
                cluster.name
            )));
        }
        let ca = cluster
            .master_auth
            .as_ref()
            .map(|auth| auth.cluster_ca_certificate.as_str())
            .filter(|ca| !ca.is_empty())
            .ok_or_else(|| {
                HandlerError::Kubeconfig(format!("cluster {} has no CA certificate", cluster.name))
            })?;

        let name = format!("gke_{}_{}_{}", project, location, cluster.name);
        Ok(Self {
            api_version: KUBECONFIG_API_VERSION,
            kind: "Config",
            clusters: vec![NamedCluster {
                name: name.clone(),
                cluster: ClusterEntry {
                    certificate_authority_data: ca.to_string(),
                    server: format!("https://{}", cluster.endpoint),
                },
            }],
            contexts: vec![NamedContext {
                name: name.clone(),
                context: ContextEntry {
                    cluster: name.clone(),
                    user: name.clone(),
                },
            }],
            current_context: name.clone(),
            users: vec![NamedUser {
                name,
                user: UserEntry {
                    exec: ExecConfig {
                        api_version: EXEC_API_VERSION,
                        command: AUTH_PLUGIN,
                        install_hint: AUTH_PLUGIN_INSTALL_HINT,
                        provide_cluster_info: true,
                    },
                },
            }],
        })
    }
}

// ============================================================================
// sos report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosMethod {
    /// Privileged `kubectl run` pod on the node, chrooted into the host.
    Pod,
    /// `gcloud compute ssh` to the node VM.
    Ssh,
}

impl SosMethod {
    fn parse(method: Option<&str>) -> Result<Self, HandlerError> {
        match method {
            None | Some("pod") => Ok(Self::Pod),
            Some("ssh") => Ok(Self::Ssh),
            Some(other) => Err(HandlerError::invalid_argument(format!(
                "method must be \"pod\" or \"ssh\", got \"{}\"",
                other
            ))),
        }
    }

    fn invocation(&self, node: &str, pod: &str) -> Invocation {
        match self {
            Self::Pod => Invocation::new(
                Program::Kubectl,
                [
                    "run",
                    pod,
                    format!("--image={}", SOS_POD_IMAGE).as_str(),
                    "--restart=Never",
                    "--rm",
                    "--stdin",
                    "--quiet",
                    format!("--overrides={}", sos_pod_overrides(node, pod)).as_str(),
                ],
            ),
            Self::Ssh => Invocation::new(
                Program::Gcloud,
                [
                    "compute",
                    "ssh",
                    node,
                    "--quiet",
                    "--command",
                    format!("sudo sh -c '{}'", SOS_SCRIPT).as_str(),
                ],
            ),
        }
    }

    /// Deletes whatever the collection left in the cluster. `--rm` covers a
    /// clean exit; this covers failures and timeouts.
    fn cleanup_invocation(&self, pod: &str) -> Option<Invocation> {
        match self {
            Self::Pod => Some(
                Invocation::new(
                    Program::Kubectl,
                    ["delete", "pod", pod, "--ignore-not-found=true", "--wait=false"],
                )
                .with_timeout(SOS_CLEANUP_TIMEOUT),
            ),
            Self::Ssh => None,
        }
    }
}

/// Unique within this process: `sos-report-{node}-{pid}-{seq}`.
fn sos_pod_name(node: &str) -> String {
    let prefix: String = node.chars().take(40).collect();
    format!(
        "sos-report-{}-{}-{}",
        prefix.trim_end_matches(['-', '.']),
        std::process::id(),
        SOS_POD_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    )
}

/// Privileged pod pinned to `node` with the host filesystem at `/host`.
/// The container name must equal the pod name for `kubectl run` to merge it.
fn sos_pod_overrides(node: &str, pod: &str) -> String {
    json!({
        "apiVersion": "v1",
        "spec": {
            "nodeName": node,
            "hostPID": true,
            "hostNetwork": true,
            "tolerations": [{ "operator": "Exists" }],
            "containers": [{
                "name": pod,
                "image": SOS_POD_IMAGE,
                "stdin": true,
                "command": ["chroot", "/host", "sh", "-c", SOS_SCRIPT],
                "securityContext": { "privileged": true },
                "volumeMounts": [{ "name": "host", "mountPath": "/host" }]
            }],
            "volumes": [{ "name": "host", "hostPath": { "path": "/" } }]
        }
    })
    .to_string()
}

/// Node names are DNS subdomains; anything else could smuggle flags or
/// shell syntax into the remote command.
fn validate_node_name(node: &str) -> Result<(), HandlerError> {
    let valid = !node.starts_with('-')
        && node
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(HandlerError::invalid_argument(format!(
            "invalid node name \"{}\"",
            node
        )))
    }
}

pub fn sos_report_path(destination: &Path, node: &str) -> PathBuf {
    destination.join(format!("sosreport-{}.tar.xz", node))
}

pub async fn get_node_sos_report(
    ctx: ToolContext<'_>,
    input: GetNodeSosReportInput,
) -> Result<String, HandlerError> {
    let node = input.node.trim();
    validate_node_name(node)?;
    let method = SosMethod::parse(non_blank(&input.method))?;
    let destination = PathBuf::from(non_blank(&input.destination).unwrap_or(DEFAULT_SOS_DESTINATION));
    let timeout = input
        .timeout_seconds
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_SOS_TIMEOUT_SECONDS);

    let pod = sos_pod_name(node);
    let invocation = method
        .invocation(node, &pod)
        .with_timeout(Duration::from_secs(timeout));
    info!(node, method = ?method, timeout_seconds = timeout, "Collecting sos report");

    let result = ctx.runner.run_checked(&invocation).await;
    if let Some(cleanup) = method.cleanup_invocation(&pod) {
        if let Err(e) = ctx.runner.run_checked(&cleanup).await {
            warn!(pod = %pod, error = %e, "Failed to delete sos report pod");
        }
    }
    let output = result?;

    if output.stdout.is_empty() {
        return Err(HandlerError::ExternalCommand(
            cloud_interface::CloudError::CommandFailed {
                command: invocation.to_string(),
                message: format!("no sos report archive received from node {}", node),
            },
        ));
    }

    tokio::fs::create_dir_all(&destination).await?;
    let path = sos_report_path(&destination, node);
    tokio::fs::write(&path, &output.stdout).await?;

    info!(node, path = %path.display(), bytes = output.stdout.len(), "Saved sos report");
    Ok(format!(
        "sos report for node {} saved to {} ({} bytes)",
        node,
        path.display(),
        output.stdout.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_client::{ApiCall, MockCloudApi, MockCommandRunner, MockResponse};
    use cloud_interface::{CommandOutput, MasterAuth};
    use gke_config::Config;

    fn cluster(name: &str, location: &str) -> Cluster {
        Cluster {
            name: name.to_string(),
            location: location.to_string(),
            endpoint: "34.1.2.3".to_string(),
            master_auth: Some(MasterAuth {
                cluster_ca_certificate: "Q0EtREFUQQ==".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn ctx<'a>(
        config: &'a Config,
        runner: &'a MockCommandRunner,
        api: &'a MockCloudApi,
    ) -> ToolContext<'a> {
        ToolContext {
            config,
            runner,
            api,
        }
    }

    #[tokio::test]
    async fn test_list_clusters_defaults_to_all_locations() {
        let config = Config::from_parts("ua", "my-project", "");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new().with_clusters(vec![
            cluster("a", "us-central1"),
            cluster("b", "europe-west1"),
        ]);

        let text = list_clusters(ctx(&config, &runner, &api), ListClustersInput::default())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["clusters"].as_array().unwrap().len(), 2);
        assert_eq!(
            api.calls().await,
            vec![ApiCall::ListClusters {
                project_id: "my-project".to_string(),
                location: "-".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_list_clusters_explicit_location() {
        let config = Config::from_parts("ua", "my-project", "us-central1");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new().with_clusters(vec![
            cluster("a", "us-central1"),
            cluster("b", "europe-west1"),
        ]);

        let input = ListClustersInput {
            project_id: Some("other".to_string()),
            location: Some("europe-west1".to_string()),
        };
        let text = list_clusters(ctx(&config, &runner, &api), input).await.unwrap();
        assert!(text.contains("\"b\""));
        assert!(!text.contains("\"a\""));
    }

    #[tokio::test]
    async fn test_list_clusters_requires_project() {
        let config = Config::default();
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();

        let err = list_clusters(ctx(&config, &runner, &api), ListClustersInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Config(_)));
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_cluster_not_found_passes_message() {
        let config = Config::from_parts("ua", "p", "us-central1");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();

        let input = GetClusterInput {
            project_id: None,
            location: None,
            name: "missing".to_string(),
        };
        let err = get_cluster(ctx(&config, &runner, &api), input).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Not found: projects/p/locations/us-central1/clusters/missing."));
    }

    #[tokio::test]
    async fn test_kubeconfig_yaml() {
        let config = Config::from_parts("ua", "proj", "us-central1");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new().with_clusters(vec![cluster("prod", "us-central1")]);

        let input = GetKubeconfigInput {
            project_id: None,
            location: None,
            name: "prod".to_string(),
        };
        let yaml = get_kubeconfig(ctx(&config, &runner, &api), input).await.unwrap();

        let doc: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(doc["apiVersion"].as_str(), Some("v1"));
        assert_eq!(doc["kind"].as_str(), Some("Config"));
        assert_eq!(doc["current-context"].as_str(), Some("gke_proj_us-central1_prod"));
        assert_eq!(
            doc["clusters"][0]["cluster"]["server"].as_str(),
            Some("https://34.1.2.3")
        );
        assert_eq!(
            doc["clusters"][0]["cluster"]["certificate-authority-data"].as_str(),
            Some("Q0EtREFUQQ==")
        );
        assert_eq!(
            doc["users"][0]["user"]["exec"]["command"].as_str(),
            Some("gke-gcloud-auth-plugin")
        );
        assert_eq!(
            doc["users"][0]["user"]["exec"]["provideClusterInfo"].as_bool(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_kubeconfig_explicit_project_and_location() {
        let config = Config::from_parts("ua", "default-proj", "us-central1");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new().with_clusters(vec![cluster("prod", "europe-west1")]);

        let input = GetKubeconfigInput {
            project_id: Some("other-proj".to_string()),
            location: Some("europe-west1".to_string()),
            name: " prod ".to_string(),
        };
        let yaml = get_kubeconfig(ctx(&config, &runner, &api), input).await.unwrap();

        let doc: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(
            doc["current-context"].as_str(),
            Some("gke_other-proj_europe-west1_prod")
        );
        assert_eq!(
            api.calls().await,
            vec![ApiCall::GetCluster {
                project_id: "other-proj".to_string(),
                location: "europe-west1".to_string(),
                name: "prod".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_kubeconfig_without_endpoint() {
        let config = Config::from_parts("ua", "proj", "us-central1");
        let runner = MockCommandRunner::new();
        let mut bare = cluster("prod", "us-central1");
        bare.endpoint.clear();
        let api = MockCloudApi::new().with_clusters(vec![bare]);

        let input = GetKubeconfigInput {
            project_id: None,
            location: None,
            name: "prod".to_string(),
        };
        let err = get_kubeconfig(ctx(&config, &runner, &api), input).await.unwrap_err();
        assert!(matches!(err, HandlerError::Kubeconfig(_)));
    }

    #[test]
    fn test_sos_method_parse() {
        assert_eq!(SosMethod::parse(None).unwrap(), SosMethod::Pod);
        assert_eq!(SosMethod::parse(Some("pod")).unwrap(), SosMethod::Pod);
        assert_eq!(SosMethod::parse(Some("ssh")).unwrap(), SosMethod::Ssh);
        let err = SosMethod::parse(Some("scp")).unwrap_err();
        assert!(err.to_string().contains("\"pod\" or \"ssh\""));
    }

    #[test]
    fn test_node_name_validation() {
        assert!(validate_node_name("gke-test-pool-abc123").is_ok());
        assert!(validate_node_name("node.internal").is_ok());
        assert!(validate_node_name("--help").is_err());
        assert!(validate_node_name("node; rm -rf /").is_err());
        assert!(validate_node_name("Node").is_err());
    }

    #[test]
    fn test_sos_invocations() {
        let pod = SosMethod::Pod.invocation("n1", "sos-report-n1-1-0");
        assert_eq!(pod.program, Program::Kubectl);
        assert_eq!(&pod.args[..2], &["run".to_string(), "sos-report-n1-1-0".to_string()]);
        assert!(pod.args.contains(&"--rm".to_string()));

        let overrides = pod
            .args
            .iter()
            .find_map(|a| a.strip_prefix("--overrides="))
            .unwrap();
        let overrides: serde_json::Value = serde_json::from_str(overrides).unwrap();
        assert_eq!(overrides["spec"]["nodeName"], "n1");
        assert_eq!(overrides["spec"]["containers"][0]["name"], "sos-report-n1-1-0");
        assert_eq!(overrides["spec"]["containers"][0]["command"][4], SOS_SCRIPT);

        let ssh = SosMethod::Ssh.invocation("n1", "unused");
        assert_eq!(ssh.program, Program::Gcloud);
        assert_eq!(&ssh.args[..3], &["compute".to_string(), "ssh".to_string(), "n1".to_string()]);
        assert!(ssh.args.last().unwrap().starts_with("sudo sh -c '"));
        assert!(SosMethod::Ssh.cleanup_invocation("unused").is_none());
    }

    #[test]
    fn test_sos_script_removes_archive() {
        assert!(SOS_SCRIPT.ends_with(r#"cat "$f" && rm -f "$f" "$f.sha256""#));
    }

    #[test]
    fn test_sos_pod_names_are_unique() {
        let a = sos_pod_name("gke-pool-1");
        let b = sos_pod_name("gke-pool-1");
        assert_ne!(a, b);
        assert!(a.starts_with("sos-report-gke-pool-1-"));

        let long = sos_pod_name(&"a-".repeat(100));
        assert!(long.len() < 80);
        assert!(!long.contains("--"));
    }

    /// The pod named in `kubectl run` followed by its deletion.
    async fn assert_pod_cleaned_up(runner: &MockCommandRunner) {
        let invocations = runner.invocations().await;
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].args[0], "run");
        let pod = invocations[0].args[1].clone();
        assert_eq!(
            invocations[1],
            Invocation::new(
                Program::Kubectl,
                ["delete", "pod", pod.as_str(), "--ignore-not-found=true", "--wait=false"],
            )
            .with_timeout(SOS_CLEANUP_TIMEOUT)
        );
    }

    #[tokio::test]
    async fn test_sos_report_written_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("reports");
        let config = Config::default();
        let runner = MockCommandRunner::new().on_any(
            Program::Kubectl,
            MockResponse::Output(CommandOutput::ok(b"archive-bytes".to_vec())),
        );
        let api = MockCloudApi::new();

        let input = GetNodeSosReportInput {
            node: "gke-pool-1".to_string(),
            destination: Some(dest.to_string_lossy().into_owned()),
            method: None,
            timeout_seconds: Some(30),
        };
        let text = get_node_sos_report(ctx(&config, &runner, &api), input)
            .await
            .unwrap();

        let path = sos_report_path(&dest, "gke-pool-1");
        assert!(text.contains(&path.display().to_string()));
        assert_eq!(std::fs::read(&path).unwrap(), b"archive-bytes");

        assert_eq!(
            runner.invocations().await[0].timeout,
            Some(Duration::from_secs(30))
        );
        assert_pod_cleaned_up(&runner).await;
    }

    #[tokio::test]
    async fn test_sos_report_timeout_still_deletes_pod() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let runner = MockCommandRunner::new()
            .on_any(Program::Kubectl, MockResponse::Timeout);
        let api = MockCloudApi::new();

        let input = GetNodeSosReportInput {
            node: "gke-pool-1".to_string(),
            destination: Some(dir.path().to_string_lossy().into_owned()),
            method: None,
            timeout_seconds: Some(5),
        };
        let err = get_node_sos_report(ctx(&config, &runner, &api), input)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 5s"));
        assert_pod_cleaned_up(&runner).await;
        assert!(!sos_report_path(dir.path(), "gke-pool-1").exists());
    }

    #[tokio::test]
    async fn test_sos_report_default_timeout_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let runner = MockCommandRunner::new().on_any(
            Program::Gcloud,
            MockResponse::Output(CommandOutput::failed(255, "ssh: connection refused")),
        );
        let api = MockCloudApi::new();

        let input = GetNodeSosReportInput {
            node: "gke-pool-1".to_string(),
            destination: Some(dir.path().to_string_lossy().into_owned()),
            method: Some("ssh".to_string()),
            timeout_seconds: None,
        };
        let err = get_node_sos_report(ctx(&config, &runner, &api), input)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ssh: connection refused"));

        let invocations = runner.invocations().await;
        assert_eq!(
            invocations[0].timeout,
            Some(Duration::from_secs(DEFAULT_SOS_TIMEOUT_SECONDS))
        );
        assert!(!sos_report_path(dir.path(), "gke-pool-1").exists());
    }

    #[tokio::test]
    async fn test_sos_report_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();

        let input = GetNodeSosReportInput {
            node: "n".to_string(),
            destination: Some(dir.path().to_string_lossy().into_owned()),
            method: None,
            timeout_seconds: None,
        };
        let err = get_node_sos_report(ctx(&config, &runner, &api), input)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no sos report archive"));
    }
}
