//! Outbound HTTP execution for upstream geolocation services.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::traits::ServiceExecutor;
use crate::types::AssembledRequest;

/// reqwest-backed [`ServiceExecutor`] with an explicit per-call
/// timeout. A slow upstream fails the one service, never the whole
/// fan-out.
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::upstream("client", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ServiceExecutor for HttpExecutor {
    async fn execute(
        &self,
        request: &AssembledRequest,
        service_id: &str,
    ) -> Result<Value, ProviderError> {
        let started = std::time::Instant::now();
        let response = self
            .client
            .get(&request.url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| ProviderError::upstream(service_id, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::upstream(
                service_id,
                format!("status {status}"),
            ));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::upstream(service_id, format!("invalid JSON body: {e}")))?;

        tracing::debug!(
            service.id = service_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream call completed"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor() -> HttpExecutor {
        HttpExecutor::new(Duration::from_secs(2), "geofan-test").unwrap()
    }

    #[tokio::test]
    async fn test_successful_call_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "ottawa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "Ottawa"}])))
            .mount(&server)
            .await;

        let mut request = AssembledRequest::new(format!("{}/search", server.uri()));
        request.params.push(("q".to_string(), "ottawa".to_string()));

        let body = executor().execute(&request, "geonames").await.unwrap();
        assert_eq!(body, json!([{"name": "Ottawa"}]));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let request = AssembledRequest::new(format!("{}/search", server.uri()));
        let err = executor().execute(&request, "geonames").await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { .. }));
        assert!(err.to_string().contains("geonames"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let request = AssembledRequest::new(format!("{}/x", server.uri()));
        let err = executor().execute(&request, "nominatim").await.unwrap_err();
        assert!(err.to_string().contains("invalid JSON body"));
    }
}
