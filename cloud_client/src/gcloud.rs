//! Subprocess runner backed by `tokio::process`.
//!
//! Binaries are resolved from [`ProcessRunnerConfig`]; by default each
//! [`Program`] is looked up on `PATH` under its usual name. Children are
//! spawned with `kill_on_drop`, so dropping the future returned by
//! [`CommandRunner::run`] terminates the process.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use cloud_interface::{CloudError, CommandOutput, CommandRunner, Invocation, Program, Result};

/// Binary locations for [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct ProcessRunnerConfig {
    /// Path to gcloud (default: "gcloud")
    pub gcloud_binary: PathBuf,
    /// Path to kubectl (default: "kubectl")
    pub kubectl_binary: PathBuf,
    /// Path to git (default: "git")
    pub git_binary: PathBuf,
}

impl Default for ProcessRunnerConfig {
    fn default() -> Self {
        Self {
            gcloud_binary: PathBuf::from(Program::Gcloud.binary_name()),
            kubectl_binary: PathBuf::from(Program::Kubectl.binary_name()),
            git_binary: PathBuf::from(Program::Git.binary_name()),
        }
    }
}

/// Runs gcloud, kubectl and git as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: ProcessRunnerConfig,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProcessRunnerConfig) -> Self {
        Self { config }
    }

    fn binary(&self, program: Program) -> &Path {
        match program {
            Program::Gcloud => &self.config.gcloud_binary,
            Program::Kubectl => &self.config.kubectl_binary,
            Program::Git => &self.config.git_binary,
        }
    }

    /// Checks that a program can be executed and returns the first line of its
    /// `--version` output.
    pub async fn verify_binary(&self, program: Program) -> Result<String> {
        let output = self
            .run(&Invocation::new(program, ["--version"]))
            .await?;

        if !output.success() {
            return Err(CloudError::BinaryNotFound {
                binary: self.binary(program).display().to_string(),
                message: "returned non-zero exit code".to_string(),
            });
        }

        let stdout = output.stdout_text();
        let version = stdout.lines().next().unwrap_or_default().trim().to_string();
        info!(program = %program, version = %version, "Found external binary");
        Ok(version)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let binary = self.binary(invocation.program);
        debug!(command = %invocation, "Executing");

        let mut command = Command::new(binary);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| CloudError::Timeout {
                    command: invocation.to_string(),
                    seconds: limit.as_secs(),
                })?,
            None => command.output().await,
        };

        let output = result.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CloudError::BinaryNotFound {
                    binary: binary.display().to_string(),
                    message: e.to_string(),
                }
            } else {
                CloudError::Io(e)
            }
        })?;

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.success() {
            warn!(command = %invocation, exit_code = ?output.exit_code, "Command exited unsuccessfully");
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn runner_with_gcloud(binary: &str) -> ProcessRunner {
        ProcessRunner::with_config(ProcessRunnerConfig {
            gcloud_binary: PathBuf::from(binary),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = runner_with_gcloud("echo");
        let output = runner
            .run(&Invocation::new(Program::Gcloud, ["hello", "world"]))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_text(), "hello world\n");
    }

    #[tokio::test]
    async fn test_captures_stderr_and_exit_code() {
        let runner = runner_with_gcloud("sh");
        let output = runner
            .run(&Invocation::new(Program::Gcloud, ["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let runner = runner_with_gcloud("sleep");
        let invocation =
            Invocation::new(Program::Gcloud, ["5"]).with_timeout(Duration::from_millis(100));

        let err = runner.run(&invocation).await.unwrap_err();
        assert!(matches!(err, CloudError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = runner_with_gcloud("/nonexistent/gcloud-binary");
        let err = runner
            .run(&Invocation::new(Program::Gcloud, ["version"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::BinaryNotFound { .. }));
    }
}
