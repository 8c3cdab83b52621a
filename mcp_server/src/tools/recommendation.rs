//! GKE diagnosis recommendations from the Recommender API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cloud_interface::GKE_DIAGNOSIS_RECOMMENDER;

use super::{non_blank, to_pretty_json, ToolContext, ToolInput};
use crate::error::HandlerError;

pub const LIST_RECOMMENDATIONS: &str = "list_recommendations";

/// Input for listing recommendations
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListRecommendationsInput {
    /// GCP project ID. Uses the configured default project when empty.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Region or zone. Uses the configured default location when empty.
    #[serde(default)]
    pub location: Option<String>,
}

impl ToolInput for ListRecommendationsInput {}

pub async fn list_recommendations(
    ctx: ToolContext<'_>,
    input: ListRecommendationsInput,
) -> Result<String, HandlerError> {
    let project = ctx.config.project_or_default(non_blank(&input.project_id))?;
    let location = ctx.config.location_or_default(non_blank(&input.location))?;

    let recommendations = ctx
        .api
        .list_recommendations(&project, &location, GKE_DIAGNOSIS_RECOMMENDER)
        .await?;
    debug!(project = %project, location = %location, count = recommendations.len(), "Listed recommendations");
    to_pretty_json(&recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_client::{ApiCall, MockCloudApi, MockCommandRunner};
    use cloud_interface::Recommendation;
    use gke_config::{Config, ConfigError};

    #[tokio::test]
    async fn test_uses_diagnosis_recommender() {
        let config = Config::from_parts("ua", "p", "us-central1");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new().with_recommendations(vec![Recommendation {
            name: "projects/p/locations/us-central1/recommenders/r/recommendations/1".to_string(),
            description: "Node pool is running out of IP addresses".to_string(),
            ..Default::default()
        }]);
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        let text = list_recommendations(ctx, Default::default()).await.unwrap();
        assert!(text.contains("running out of IP addresses"));
        assert_eq!(
            api.calls().await,
            vec![ApiCall::ListRecommendations {
                project_id: "p".to_string(),
                location: "us-central1".to_string(),
                recommender: "google.container.DiagnosisRecommender".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_location_required() {
        let config = Config::from_parts("ua", "p", "");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        let err = list_recommendations(ctx, Default::default()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Config(ConfigError::MissingLocation)));
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_is_empty_array() {
        let config = Config::from_parts("ua", "p", "l");
        let runner = MockCommandRunner::new();
        let api = MockCloudApi::new();
        let ctx = ToolContext {
            config: &config,
            runner: &runner,
            api: &api,
        };

        assert_eq!(list_recommendations(ctx, Default::default()).await.unwrap(), "[]");
    }
}
