//! Cluster Toolkit download.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use cloud_interface::{Invocation, Program};

use super::{ToolContext, ToolInput};
use crate::error::HandlerError;

pub const CLUSTER_TOOLKIT_DOWNLOAD: &str = "cluster_toolkit_download";

pub const CLUSTER_TOOLKIT_REPO: &str = "https://github.com/GoogleCloudPlatform/cluster-toolkit.git";

/// Input for downloading Cluster Toolkit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClusterToolkitDownloadInput {
    /// Local directory to clone into. The repository lands in a "cluster-toolkit" subdirectory.
    pub download_directory: String,
}

impl ToolInput for ClusterToolkitDownloadInput {
    const REQUIRED: &'static [&'static str] = &["download_directory"];
}

impl ClusterToolkitDownloadInput {
    pub fn invocation(&self) -> Invocation {
        let target = Path::new(&self.download_directory).join("cluster-toolkit");
        Invocation::new(
            Program::Git,
            [
                "clone".to_string(),
                CLUSTER_TOOLKIT_REPO.to_string(),
                target.to_string_lossy().into_owned(),
            ],
        )
    }
}

pub async fn cluster_toolkit_download(
    ctx: ToolContext<'_>,
    input: ClusterToolkitDownloadInput,
) -> Result<String, HandlerError> {
    let invocation = input.invocation();
    let output = ctx.runner.run_checked(&invocation).await?;

    let target = invocation.args.last().cloned().unwrap_or_default();
    info!(target = %target, "Downloaded Cluster Toolkit");

    let mut text = format!("Cluster Toolkit downloaded to {}", target);
    let detail = output.stdout_text();
    if !detail.trim().is_empty() {
        text.push('\n');
        text.push_str(detail.trim_end());
    }
    Ok(text)
}
