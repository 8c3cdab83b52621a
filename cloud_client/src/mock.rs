//! In-memory runner and API for testing and development.
//!
//! Both mocks record every call so tests can assert on the exact external
//! invocation a handler built, or that no call happened at all.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use cloud_interface::{
    CloudApi, CloudError, Cluster, CommandOutput, CommandRunner, Invocation,
    ListClustersResponse, MonitoredResourceDescriptor, Program, Recommendation, Result,
};

/// Scripted outcome for a mocked command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(CommandOutput),
    Timeout,
    NotFound,
}

#[derive(Debug, Clone)]
struct Rule {
    program: Program,
    /// Exact argument list to match; `None` matches any arguments.
    args: Option<Vec<String>>,
    response: MockResponse,
}

/// Command runner that answers from a rule list instead of spawning processes.
///
/// Rules are checked in insertion order; the first match wins. Unmatched
/// invocations succeed with empty stdout.
#[derive(Debug, Clone, Default)]
pub struct MockCommandRunner {
    rules: Vec<Rule>,
    invocations: Arc<RwLock<Vec<Invocation>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `program args...` with `response`.
    pub fn on(mut self, program: Program, args: &[&str], response: MockResponse) -> Self {
        self.rules.push(Rule {
            program,
            args: Some(args.iter().map(|a| a.to_string()).collect()),
            response,
        });
        self
    }

    /// Answer every invocation of `program` with `response`.
    pub fn on_any(mut self, program: Program, response: MockResponse) -> Self {
        self.rules.push(Rule {
            program,
            args: None,
            response,
        });
        self
    }

    /// All invocations received so far (for testing).
    pub async fn invocations(&self) -> Vec<Invocation> {
        self.invocations.read().await.clone()
    }

    /// Number of invocations received so far (for testing).
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    fn response_for(&self, invocation: &Invocation) -> MockResponse {
        self.rules
            .iter()
            .find(|rule| {
                rule.program == invocation.program
                    && rule.args.as_ref().map_or(true, |args| *args == invocation.args)
            })
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| MockResponse::Output(CommandOutput::ok(Vec::new())))
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(command = %invocation, "MockCommandRunner: run");
        self.invocations.write().await.push(invocation.clone());

        match self.response_for(invocation) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::Timeout => Err(CloudError::Timeout {
                command: invocation.to_string(),
                seconds: invocation.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }),
            MockResponse::NotFound => Err(CloudError::BinaryNotFound {
                binary: invocation.program.to_string(),
                message: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}

/// A single recorded [`CloudApi`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListClusters { project_id: String, location: String },
    GetCluster { project_id: String, location: String, name: String },
    ListDescriptors { project_id: String, filter: Option<String> },
    ListRecommendations { project_id: String, location: String, recommender: String },
}

/// Cloud API backed by fixed data.
#[derive(Debug, Clone, Default)]
pub struct MockCloudApi {
    clusters: Vec<Cluster>,
    descriptors: Vec<MonitoredResourceDescriptor>,
    recommendations: Vec<Recommendation>,
    /// When set, every call fails with this status and message.
    failure: Option<(u16, String)>,
    calls: Arc<RwLock<Vec<ApiCall>>>,
}

impl MockCloudApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters(mut self, clusters: Vec<Cluster>) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_descriptors(mut self, descriptors: Vec<MonitoredResourceDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<Recommendation>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn failing(mut self, status: u16, message: impl Into<String>) -> Self {
        self.failure = Some((status, message.into()));
        self
    }

    /// All calls received so far (for testing).
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }

    async fn record(&self, service: &str, call: ApiCall) -> Result<()> {
        self.calls.write().await.push(call);
        match &self.failure {
            Some((status, message)) => Err(CloudError::Api {
                service: service.to_string(),
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn list_clusters(
        &self,
        project_id: &str,
        location: &str,
    ) -> Result<ListClustersResponse> {
        self.record(
            "container",
            ApiCall::ListClusters {
                project_id: project_id.to_string(),
                location: location.to_string(),
            },
        )
        .await?;

        let clusters = self
            .clusters
            .iter()
            .filter(|c| location == "-" || c.location == location)
            .cloned()
            .collect();

        Ok(ListClustersResponse {
            clusters,
            missing_zones: Vec::new(),
        })
    }

    async fn get_cluster(&self, project_id: &str, location: &str, name: &str) -> Result<Cluster> {
        self.record(
            "container",
            ApiCall::GetCluster {
                project_id: project_id.to_string(),
                location: location.to_string(),
                name: name.to_string(),
            },
        )
        .await?;

        self.clusters
            .iter()
            .find(|c| c.name == name && c.location == location)
            .cloned()
            .ok_or_else(|| CloudError::Api {
                service: "container".to_string(),
                status: 404,
                message: format!(
                    "Not found: projects/{}/locations/{}/clusters/{}.",
                    project_id, location, name
                ),
            })
    }

    async fn list_monitored_resource_descriptors(
        &self,
        project_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<MonitoredResourceDescriptor>> {
        self.record(
            "monitoring",
            ApiCall::ListDescriptors {
                project_id: project_id.to_string(),
                filter: filter.map(str::to_string),
            },
        )
        .await?;
        Ok(self.descriptors.clone())
    }

    async fn list_recommendations(
        &self,
        project_id: &str,
        location: &str,
        recommender: &str,
    ) -> Result<Vec<Recommendation>> {
        self.record(
            "recommender",
            ApiCall::ListRecommendations {
                project_id: project_id.to_string(),
                location: location.to_string(),
                recommender: recommender.to_string(),
            },
        )
        .await?;
        Ok(self.recommendations.clone())
    }
}
