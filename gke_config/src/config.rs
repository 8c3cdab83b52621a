//! Effective configuration resolved from gcloud.

use tracing::{debug, info, warn};

use cloud_interface::{CommandRunner, Invocation, Program};

use crate::error::{ConfigError, Result};

/// Prefix of the user agent sent to Google APIs.
pub const USER_AGENT_PREFIX: &str = "gke-mcp";

/// Read-only server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    user_agent: String,
    default_project_id: String,
    default_location: String,
}

impl Config {
    /// Build a config from already-known values.
    pub fn from_parts(
        user_agent: impl Into<String>,
        default_project_id: impl Into<String>,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            default_project_id: default_project_id.into(),
            default_location: default_location.into(),
        }
    }

    /// `gke-mcp/<version>`.
    pub fn user_agent_for(version: &str) -> String {
        format!("{}/{}", USER_AGENT_PREFIX, version)
    }

    /// Resolve defaults from the local gcloud configuration.
    ///
    /// Never fails: a gcloud error is logged and leaves that default empty.
    pub async fn resolve(version: &str, runner: &dyn CommandRunner) -> Self {
        let config = Self {
            user_agent: Self::user_agent_for(version),
            default_project_id: default_project_id(runner).await,
            default_location: default_location(runner).await,
        };

        info!(
            user_agent = %config.user_agent,
            project = %config.default_project_id,
            location = %config.default_location,
            "Resolved configuration"
        );
        config
    }

    /// Replace defaults with explicit values. Blank overrides are ignored.
    pub fn with_overrides(mut self, project: Option<String>, location: Option<String>) -> Self {
        if let Some(project) = project.filter(|p| !p.trim().is_empty()) {
            self.default_project_id = project.trim().to_string();
        }
        if let Some(location) = location.filter(|l| !l.trim().is_empty()) {
            self.default_location = location.trim().to_string();
        }
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn default_project_id(&self) -> &str {
        &self.default_project_id
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    /// The explicit project when non-blank, otherwise the default.
    pub fn project_or_default(&self, explicit: Option<&str>) -> Result<String> {
        pick(explicit, &self.default_project_id).ok_or(ConfigError::MissingProject)
    }

    /// The explicit location when non-blank, otherwise the default.
    pub fn location_or_default(&self, explicit: Option<&str>) -> Result<String> {
        pick(explicit, &self.default_location).ok_or(ConfigError::MissingLocation)
    }
}

fn pick(explicit: Option<&str>, default: &str) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| Some(default).filter(|d| !d.is_empty()))
        .map(str::to_string)
}

/// `gcloud config get <key>`, trimmed.
async fn gcloud_config_get(
    runner: &dyn CommandRunner,
    key: &str,
) -> cloud_interface::Result<String> {
    let output = runner
        .run_checked(&Invocation::new(Program::Gcloud, ["config", "get", key]))
        .await?;
    let value = output.stdout_text().trim().to_string();
    debug!(key, value = %value, "gcloud config value");
    Ok(value)
}

async fn default_project_id(runner: &dyn CommandRunner) -> String {
    match gcloud_config_get(runner, "core/project").await {
        Ok(project) => project,
        Err(e) => {
            warn!(error = %e, "Failed to read default project from gcloud");
            String::new()
        }
    }
}

/// Region first, then zone.
async fn default_location(runner: &dyn CommandRunner) -> String {
    match gcloud_config_get(runner, "compute/region").await {
        Ok(region) if !region.is_empty() => return region,
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to read default region from gcloud"),
    }

    match gcloud_config_get(runner, "compute/zone").await {
        Ok(zone) => zone,
        Err(e) => {
            warn!(error = %e, "Failed to read default zone from gcloud");
            String::new()
        }
    }
}
