//! External seams of the GKE MCP server.
//!
//! Every tool handler ends in exactly one of two kinds of external call: a
//! subprocess (`gcloud`, `kubectl`, `git`) run through a [`CommandRunner`], or
//! a Google Cloud REST request made through a [`CloudApi`]. Both are traits so
//! that the server can be driven by in-memory mocks in tests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result type for external calls.
pub type Result<T> = std::result::Result<T, CloudError>;

/// Errors raised by external commands and cloud APIs.
///
/// Messages coming from the external side are passed through verbatim.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("{binary} binary not found: {message}")]
    BinaryNotFound { binary: String, message: String },

    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("{service} API error ({status}): {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Commands
// ============================================================================

/// The external programs the server is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    Gcloud,
    Kubectl,
    Git,
}

impl Program {
    /// Default binary name looked up on `PATH`.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Program::Gcloud => "gcloud",
            Program::Kubectl => "kubectl",
            Program::Git => "git",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// A fully-built subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,
    pub args: Vec<String>,
    /// Upper bound on run time. `None` leaves cancellation to the caller.
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<I, S>(program: Program, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the invocation to completion and returns whatever it produced,
    /// regardless of exit status.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Like [`run`](Self::run), but a non-zero exit becomes
    /// [`CloudError::CommandFailed`] carrying the process stderr.
    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CloudError::CommandFailed {
                command: invocation.to_string(),
                message: output.failure_message(),
            })
        }
    }
}

// ============================================================================
// Cloud APIs
// ============================================================================

/// Recommender ID used for GKE diagnosis recommendations.
pub const GKE_DIAGNOSIS_RECOMMENDER: &str = "google.container.DiagnosisRecommender";

/// Read-only Google Cloud API surface used by the tools.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Lists clusters in a project. `location` may be `-` for all locations.
    async fn list_clusters(&self, project_id: &str, location: &str)
        -> Result<ListClustersResponse>;

    /// Gets a single cluster.
    async fn get_cluster(&self, project_id: &str, location: &str, name: &str) -> Result<Cluster>;

    /// Lists monitored resource descriptors, following every page.
    async fn list_monitored_resource_descriptors(
        &self,
        project_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<MonitoredResourceDescriptor>>;

    /// Lists recommendations of one recommender, following every page.
    async fn list_recommendations(
        &self,
        project_id: &str,
        location: &str,
        recommender: &str,
    ) -> Result<Vec<Recommendation>>;
}

/// A GKE cluster as returned by the Container API.
///
/// Only the fields the server reads are typed; everything else is kept in
/// `extra` so that responses are passed back to the client intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_auth: Option<MasterAuth>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_master_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cluster control-plane authentication data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    /// Base64-encoded PEM of the cluster CA.
    #[serde(default)]
    pub cluster_ca_certificate: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    /// Zones that could not be reached while listing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_zones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredResourceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<LabelDescriptor>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub launch_stage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDescriptor {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A Recommender API recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recommender_subtype: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
