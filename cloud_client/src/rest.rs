//! Google Cloud REST client.
//!
//! Talks to the Container, Cloud Monitoring and Recommender v1/v3 JSON APIs
//! with an OAuth access token obtained from `gcloud auth print-access-token`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use cloud_interface::{
    CloudApi, CloudError, Cluster, CommandRunner, Invocation, ListClustersResponse,
    MonitoredResourceDescriptor, Program, Recommendation, Result,
};

/// Base URLs of the APIs used by the server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub container: String,
    pub monitoring: String,
    pub recommender: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            container: "https://container.googleapis.com".to_string(),
            monitoring: "https://monitoring.googleapis.com".to_string(),
            recommender: "https://recommender.googleapis.com".to_string(),
        }
    }
}

/// [`CloudApi`] implementation over HTTPS.
pub struct RestCloudApi {
    client: Client,
    endpoints: Endpoints,
    runner: Arc<dyn CommandRunner>,
}

impl RestCloudApi {
    /// Create a client that identifies itself with `user_agent` and fetches
    /// tokens through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>, user_agent: &str) -> Result<Self> {
        Self::with_endpoints(runner, user_agent, Endpoints::default())
    }

    pub fn with_endpoints(
        runner: Arc<dyn CommandRunner>,
        user_agent: &str,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| CloudError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoints: Endpoints {
                container: endpoints.container.trim_end_matches('/').to_string(),
                monitoring: endpoints.monitoring.trim_end_matches('/').to_string(),
                recommender: endpoints.recommender.trim_end_matches('/').to_string(),
            },
            runner,
        })
    }

    fn clusters_url(&self, project_id: &str, location: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/clusters",
            self.endpoints.container, project_id, location
        )
    }

    fn descriptors_url(&self, project_id: &str) -> String {
        format!(
            "{}/v3/projects/{}/monitoredResourceDescriptors",
            self.endpoints.monitoring, project_id
        )
    }

    fn recommendations_url(&self, project_id: &str, location: &str, recommender: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/recommenders/{}/recommendations",
            self.endpoints.recommender, project_id, location, recommender
        )
    }

    async fn access_token(&self) -> Result<String> {
        let output = self
            .runner
            .run_checked(&Invocation::new(
                Program::Gcloud,
                ["auth", "print-access-token"],
            ))
            .await
            .map_err(|e| CloudError::Auth(e.to_string()))?;

        let token = output.stdout_text().trim().to_string();
        if token.is_empty() {
            return Err(CloudError::Auth(
                "gcloud returned an empty access token".to_string(),
            ));
        }
        Ok(token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        debug!(service, url, "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CloudError::Http(e.to_string()))?;

        handle_response(service, response).await
    }
}

async fn handle_response<T: DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CloudError::Http(e.to_string()))?;

    if status.is_success() {
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(api_error(service, status.as_u16(), &body))
    }
}

/// Google APIs report failures as `{"error": {"code", "message", "status"}}`.
fn api_error(service: &str, status: u16, body: &str) -> CloudError {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: String,
    }

    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    };

    CloudError::Api {
        service: service.to_string(),
        status,
        message,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptorPage {
    #[serde(default)]
    resource_descriptors: Vec<MonitoredResourceDescriptor>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationPage {
    #[serde(default)]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    next_page_token: String,
}

#[async_trait]
impl CloudApi for RestCloudApi {
    async fn list_clusters(
        &self,
        project_id: &str,
        location: &str,
    ) -> Result<ListClustersResponse> {
        self.get_json("container", &self.clusters_url(project_id, location), &[])
            .await
    }

    async fn get_cluster(&self, project_id: &str, location: &str, name: &str) -> Result<Cluster> {
        let url = format!("{}/{}", self.clusters_url(project_id, location), name);
        self.get_json("container", &url, &[]).await
    }

    async fn list_monitored_resource_descriptors(
        &self,
        project_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<MonitoredResourceDescriptor>> {
        let url = self.descriptors_url(project_id);
        let mut descriptors = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut query = Vec::new();
            if let Some(filter) = filter {
                query.push(("filter", filter));
            }
            if !page_token.is_empty() {
                query.push(("pageToken", page_token.as_str()));
            }

            let page: DescriptorPage = self.get_json("monitoring", &url, &query).await?;
            descriptors.extend(page.resource_descriptors);

            if page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        Ok(descriptors)
    }

    async fn list_recommendations(
        &self,
        project_id: &str,
        location: &str,
        recommender: &str,
    ) -> Result<Vec<Recommendation>> {
        let url = self.recommendations_url(project_id, location, recommender);
        let mut recommendations = Vec::new();
        let mut page_token = String::new();

        loop {
            let query: Vec<(&str, &str)> = if page_token.is_empty() {
                Vec::new()
            } else {
                vec![("pageToken", page_token.as_str())]
            };

            let page: RecommendationPage = self.get_json("recommender", &url, &query).await?;
            recommendations.extend(page.recommendations);

            if page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCommandRunner, MockResponse};
    use cloud_interface::{CommandOutput, GKE_DIAGNOSIS_RECOMMENDER};

    fn api_with(runner: MockCommandRunner) -> RestCloudApi {
        RestCloudApi::with_endpoints(
            Arc::new(runner),
            "gke-mcp/test",
            Endpoints {
                container: "https://container.example.com/".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let api = api_with(MockCommandRunner::new());

        assert_eq!(
            api.clusters_url("my-project", "-"),
            "https://container.example.com/v1/projects/my-project/locations/-/clusters"
        );
        assert_eq!(
            api.descriptors_url("my-project"),
            "https://monitoring.googleapis.com/v3/projects/my-project/monitoredResourceDescriptors"
        );
        assert_eq!(
            api.recommendations_url("p", "us-central1", GKE_DIAGNOSIS_RECOMMENDER),
            "https://recommender.googleapis.com/v1/projects/p/locations/us-central1/recommenders/google.container.DiagnosisRecommender/recommendations"
        );
    }

    #[test]
    fn test_api_error_uses_google_message() {
        let body = r#"{"error": {"code": 404, "message": "Not found: projects/p/locations/l/clusters/c.", "status": "NOT_FOUND"}}"#;
        let err = api_error("container", 404, body);
        assert_eq!(
            err.to_string(),
            "container API error (404): Not found: projects/p/locations/l/clusters/c."
        );
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = api_error("monitoring", 502, "Bad Gateway\n");
        assert_eq!(err.to_string(), "monitoring API error (502): Bad Gateway");
    }

    #[tokio::test]
    async fn test_access_token_trimmed() {
        let runner = MockCommandRunner::new().on(
            Program::Gcloud,
            &["auth", "print-access-token"],
            MockResponse::Output(CommandOutput::ok("ya29.token\n")),
        );
        let api = api_with(runner);

        assert_eq!(api.access_token().await.unwrap(), "ya29.token");
    }

    #[tokio::test]
    async fn test_access_token_failure_is_auth_error() {
        let runner = MockCommandRunner::new().on(
            Program::Gcloud,
            &["auth", "print-access-token"],
            MockResponse::Output(CommandOutput::failed(1, "You do not currently have an active account selected.")),
        );
        let api = api_with(runner);

        let err = api.access_token().await.unwrap_err();
        assert!(matches!(err, CloudError::Auth(_)));
        assert!(err.to_string().contains("active account"));
    }

    #[tokio::test]
    async fn test_empty_access_token_rejected() {
        let api = api_with(MockCommandRunner::new());
        assert!(matches!(api.access_token().await, Err(CloudError::Auth(_))));
    }
}
