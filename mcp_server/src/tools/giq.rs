//! GKE Inference Quickstart manifest generation.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use cloud_interface::{Invocation, Program};

use super::{non_blank, ToolContext, ToolInput};
use crate::error::HandlerError;

pub const GIQ_GENERATE_MANIFEST: &str = "giq_generate_manifest";

/// Input for generating an inference manifest
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GiqGenerateManifestInput {
    /// The model to use. Get the list of valid models from 'gcloud container ai profiles models list' if the user doesn't provide it.
    pub model: String,
    /// The model server to use. Get the list of valid model servers from 'gcloud container ai profiles list --format='table(modelServerInfo.model,modelServerInfo.modelServer,modelServerInfo.modelServerVersion,acceleratorType)' if the user doesn't provide it. You can filter that gcloud command on '--model={model}' if the user provides the model.
    pub model_server: String,
    /// The accelerator to use. Get the list of valid accelerators from 'gcloud container ai profiles list --format='table(modelServerInfo.model,modelServerInfo.modelServer,modelServerInfo.modelServerVersion,acceleratorType)' if the user doesn't provide it. You can filter that gcloud command on '--model={model}' and '--model-server={model-server}' if the user provides those values.
    pub accelerator: String,
    /// The maximum normalized time per output token (NTPOT) in milliseconds. NTPOT is measured as the request_latency / output_tokens.
    #[serde(default, deserialize_with = "string_or_number")]
    #[schemars(with = "Option<String>")]
    pub target_ntpot_milliseconds: Option<String>,
}

impl ToolInput for GiqGenerateManifestInput {
    const REQUIRED: &'static [&'static str] = &["model", "model_server", "accelerator"];
}

/// Clients send the latency target as either `"200"` or `200`.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

impl GiqGenerateManifestInput {
    /// `gcloud container ai profiles manifests create ...`
    pub fn invocation(&self) -> Invocation {
        let mut args = vec![
            "container".to_string(),
            "ai".to_string(),
            "profiles".to_string(),
            "manifests".to_string(),
            "create".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--model-server".to_string(),
            self.model_server.clone(),
            "--accelerator-type".to_string(),
            self.accelerator.clone(),
        ];
        if let Some(target) = non_blank(&self.target_ntpot_milliseconds) {
            args.push("--target-ntpot-milliseconds".to_string());
            args.push(target.to_string());
        }
        Invocation::new(Program::Gcloud, args)
    }
}

pub async fn giq_generate_manifest(
    ctx: ToolContext<'_>,
    input: GiqGenerateManifestInput,
) -> Result<String, HandlerError> {
    let output = ctx
        .runner
        .run_checked(&input.invocation())
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to generate manifest"))?;
    Ok(output.stdout_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::parse_input;
    use cloud_client::{MockCloudApi, MockCommandRunner, MockResponse};
    use cloud_interface::CommandOutput;
    use gke_config::Config;
    use serde_json::json;

    fn input(target: Option<&str>) -> GiqGenerateManifestInput {
        GiqGenerateManifestInput {
            model: "google/gemma-2b".to_string(),
            model_server: "vllm".to_string(),
            accelerator: "nvidia-l4".to_string(),
            target_ntpot_milliseconds: target.map(str::to_string),
        }
    }

    #[test]
    fn test_invocation_without_target() {
        let inv = input(None).invocation();
        assert_eq!(
            inv.to_string(),
            "gcloud container ai profiles manifests create --model google/gemma-2b --model-server vllm --accelerator-type nvidia-l4"
        );
    }

    #[test]
    fn test_invocation_with_target() {
        let inv = input(Some("200")).invocation();
        assert_eq!(
            &inv.args[inv.args.len() - 2..],
            &["--target-ntpot-milliseconds".to_string(), "200".to_string()]
        );
        assert_eq!(input(Some("")).invocation().args.len(), 11);
    }

    #[test]
    fn test_validation_order() {
        let cases = [
            (json!({"model": "", "model_server": "", "accelerator": ""}), "model argument cannot be empty"),
            (json!({"model": "m", "model_server": " ", "accelerator": "a"}), "model_server argument cannot be empty"),
            (json!({"model": "m", "model_server": "s", "accelerator": ""}), "accelerator argument cannot be empty"),
        ];
        for (args, expected) in cases {
            let err = parse_input::<GiqGenerateManifestInput>(args).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_target_accepts_number() {
        let parsed: GiqGenerateManifestInput = parse_input(json!({
            "model": "m", "model_server": "s", "accelerator": "a",
            "target_ntpot_milliseconds": 150
        }))
        .unwrap();
        assert_eq!(parsed.target_ntpot_milliseconds.as_deref(), Some("150"));
    }

    #[tokio::test]
    async fn test_manifest_returned() {
        let config = Config::default();
        let runner = MockCommandRunner::new().on_any(
            Program::Gcloud,
            MockResponse::Output(CommandOutput::ok("apiVersion: apps/v1\nkind: Deployment\n")),
        );
        let api = MockCloudApi::new();
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        let text = giq_generate_manifest(ctx, input(None)).await.unwrap();
        assert!(text.starts_with("apiVersion: apps/v1"));
        assert_eq!(runner.invocations().await[0], input(None).invocation());
    }

    #[tokio::test]
    async fn test_gcloud_failure_passes_stderr() {
        let config = Config::default();
        let runner = MockCommandRunner::new().on_any(
            Program::Gcloud,
            MockResponse::Output(CommandOutput::failed(1, "ERROR: (gcloud) model not found")),
        );
        let api = MockCloudApi::new();
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        let err = giq_generate_manifest(ctx, input(None)).await.unwrap_err();
        assert!(err.to_string().ends_with("ERROR: (gcloud) model not found"));
    }
}
