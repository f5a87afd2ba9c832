use crate::error::{ClientError, PREDICTION_FALLBACK};
use crate::model::{ApiInfo, ErrorBody, InputData, ModelConfig, PredictionResult};

/// Default backend location when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Reachability as shown by the status indicator
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ApiStatus {
    #[default]
    Checking,
    Connected(ApiInfo),
    Disconnected,
}

impl ApiStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ApiStatus::Connected(_))
    }
}

/// HTTP client for the prediction service
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reachability check against `GET /`
    pub async fn check_status(&self) -> Result<ApiInfo, ClientError> {
        let url = self.url("/");
        let disconnected = || ClientError::Connectivity { url: self.base_url.clone() };

        let resp = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Status check to {} failed: {}", url, e);
                return Err(disconnected());
            }
        };

        if !resp.status().is_success() {
            tracing::warn!("Status check to {} returned {}", url, resp.status());
            return Err(disconnected());
        }

        // Any 2xx counts; the body is informational only
        let info = resp.json::<ApiInfo>().await.unwrap_or_default();
        tracing::debug!("API reachable: {:?}", info.message);
        Ok(info)
    }

    /// Fetch the model schema from `GET /config`
    pub async fn fetch_config(&self) -> Result<ModelConfig, ClientError> {
        let url = self.url("/config");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::config(e.to_string()))?;

        if !resp.status().is_success() {
            tracing::warn!("GET {} returned {}", url, resp.status());
            return Err(ClientError::config("Failed to load configuration"));
        }

        let config: ModelConfig = resp
            .json()
            .await
            .map_err(|e| ClientError::config(format!("invalid configuration: {}", e)))?;

        tracing::info!(
            "Loaded configuration for {} ({} features)",
            config.model.name,
            config.features.len()
        );
        Ok(config)
    }

    /// Submit input to `POST /predict`
    pub async fn predict(&self, input: &InputData) -> Result<PredictionResult, ClientError> {
        let url = self.url("/predict");
        tracing::debug!("Posting {} values to {}", input.len(), url);

        let resp = self
            .http
            .post(&url)
            .json(input)
            .send()
            .await
            .map_err(|e| ClientError::prediction(format!("Request to {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<ErrorBody>().await.unwrap_or_default();
            tracing::warn!("Prediction rejected with {}: {}", status, body.error);
            let message = body
                .message()
                .unwrap_or_else(|| PREDICTION_FALLBACK.to_string());
            return Err(ClientError::prediction(message));
        }

        let result: PredictionResult = resp
            .json()
            .await
            .map_err(|e| ClientError::prediction(format!("Invalid prediction response: {}", e)))?;

        tracing::info!("Prediction: {} {}", result.prediction, result.unit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InputValue;
    use crate::testing::{mock_api, serve, unused_url};
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};

    #[tokio::test]
    async fn test_status_connected() {
        let base = serve(mock_api()).await;
        let client = ApiClient::new(format!("{}/", base)).unwrap();
        assert_eq!(client.base_url(), base);

        let info = client.check_status().await.unwrap();
        assert_eq!(info.model.as_deref(), Some("Salary Predictor"));
        assert!(info.endpoints.contains_key("/predict"));
    }

    #[tokio::test]
    async fn test_status_plain_text_body_still_connected() {
        let router = Router::new().route("/", get(|| async { "ok" }));
        let client = ApiClient::new(serve(router).await).unwrap();
        assert_eq!(client.check_status().await.unwrap(), ApiInfo::default());
    }

    #[tokio::test]
    async fn test_status_non_success_is_connectivity_error() {
        let router = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let client = ApiClient::new(serve(router).await).unwrap();
        assert!(matches!(client.check_status().await, Err(ClientError::Connectivity { .. })));
    }

    #[tokio::test]
    async fn test_status_unreachable() {
        let client = ApiClient::new(unused_url().await).unwrap();
        let err = client.check_status().await.unwrap_err();
        assert!(matches!(err, ClientError::Connectivity { .. }));
        assert!(err.to_string().contains("Make sure the prediction server is running"));
    }

    #[tokio::test]
    async fn test_fetch_config() {
        let client = ApiClient::new(serve(mock_api()).await).unwrap();
        let config = client.fetch_config().await.unwrap();
        assert_eq!(config.model.name, "Salary Predictor");
        assert_eq!(config.features.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_config_errors() {
        let router = Router::new()
            .route("/config", get(|| async { StatusCode::NOT_FOUND }));
        let client = ApiClient::new(serve(router).await).unwrap();
        let err = client.fetch_config().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to load model configuration: Failed to load configuration"
        );

        let router = Router::new()
            .route("/config", get(|| async { Json(serde_json::json!({"features": []})) }));
        let client = ApiClient::new(serve(router).await).unwrap();
        assert!(matches!(client.fetch_config().await, Err(ClientError::Config { .. })));
    }

    #[tokio::test]
    async fn test_fetch_config_without_features() {
        let router = Router::new()
            .route("/config", get(|| async { Json(serde_json::json!({"model": {"name": "X"}})) }));
        let client = ApiClient::new(serve(router).await).unwrap();
        assert!(matches!(client.fetch_config().await, Err(ClientError::Config { .. })));
    }

    #[tokio::test]
    async fn test_predict_success_sends_typed_values() {
        let router = Router::new().route(
            "/predict",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["Age"], serde_json::json!(28.0));
                assert_eq!(body["Country"], serde_json::json!("Germany"));
                Json(serde_json::json!({"success": true, "prediction": 452300.7, "unit": "USD", "input": body}))
            }),
        );
        let client = ApiClient::new(serve(router).await).unwrap();

        let mut input = InputData::new();
        input.insert("Age", InputValue::Number(28.0));
        input.insert("Country", InputValue::Text("Germany".to_string()));

        let result = client.predict(&input).await.unwrap();
        assert_eq!(result.prediction, 452300.7);
        assert_eq!(result.unit, "USD");
    }

    #[tokio::test]
    async fn test_predict_server_error_message() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": "bad input"})))
            }),
        );
        let client = ApiClient::new(serve(router).await).unwrap();
        let err = client.predict(&InputData::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "bad input");
    }

    #[tokio::test]
    async fn test_predict_error_fallback() {
        let router = Router::new()
            .route("/predict", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let client = ApiClient::new(serve(router).await).unwrap();
        let err = client.predict(&InputData::new()).await.unwrap_err();
        assert_eq!(err.to_string(), PREDICTION_FALLBACK);
    }

    #[tokio::test]
    async fn test_predict_numeric_error_field() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": 123}))) }),
        );
        let client = ApiClient::new(serve(router).await).unwrap();
        let err = client.predict(&InputData::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "123");
    }

    #[tokio::test]
    async fn test_predict_error_body_without_field() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_REQUEST, Json(serde_json::json!({"detail": "x"}))) }),
        );
        let client = ApiClient::new(serve(router).await).unwrap();
        let err = client.predict(&InputData::new()).await.unwrap_err();
        assert_eq!(err.to_string(), PREDICTION_FALLBACK);
    }
}
