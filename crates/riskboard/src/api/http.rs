//! reqwest implementation of the prediction API
//!
//! Transport failures and timeouts become `StoreError::Network`; any non-2xx
//! status or undecodable body becomes `StoreError::Server`, carrying the
//! backend's `detail` text when it sent one.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::types::{
  Alert, AlertReceipt, AlertRequest, AlertsEnvelope, BatchPredicted, DatasetGenerated,
  InterventionRecorded, InterventionRequest, ModelMetrics, NewStudent, Prediction, Stats, Student,
  StudentCreated, StudentDetail, StudentsEnvelope, TrainEnvelope, TrainingCount,
};
use super::DashboardApi;
use crate::config::ClientConfig;
use crate::error::{Result, StoreError};

/// HTTP method types for REST API calls
#[derive(Debug, Copy, Clone)]
enum HttpMethod {
  Get,
  Post,
}

impl std::fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let method_str = match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
    };
    write!(f, "{method_str}")
  }
}

/// HTTP client for the prediction API
pub struct HttpDashboardApi {
  client: Client,
  config: ClientConfig,
}

/// Classify a response: non-2xx is a server rejection, otherwise decode the body
async fn parse_response<R>(response: Response, method: HttpMethod, endpoint: &str) -> Result<R>
where
  R: DeserializeOwned,
{
  let status = response.status();
  let body = response
    .text()
    .await
    .map_err(|e| StoreError::network(format!("Failed reading {method} {endpoint} response: {e}")))?;

  if !status.is_success() {
    debug!(%method, endpoint, status = status.as_u16(), "request rejected");
    return Err(StoreError::server(status.as_u16(), error_message(status, &body)));
  }

  serde_json::from_str(&body).map_err(|e| {
    StoreError::server(status.as_u16(), format!("Malformed response from {method} {endpoint}: {e}"))
  })
}

/// Pull the human-readable message out of an error body
fn error_message(status: StatusCode, body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<Value>(body) {
    for key in ["detail", "message", "error"] {
      match &value[key] {
        Value::Null => continue,
        Value::String(text) if text.is_empty() => continue,
        Value::String(text) => return text.clone(),
        // FastAPI validation failures send a list of problems
        other => return other.to_string(),
      }
    }
  }

  let trimmed = body.trim();
  if !trimmed.is_empty() {
    return trimmed.to_string();
  }

  status.canonical_reason().unwrap_or("request failed").to_string()
}

// Client Constructor
// ==================
impl HttpDashboardApi {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| StoreError::network(format!("Failed to create HTTP client: {e}")))?;

    Ok(Self { client, config })
  }
}

// HTTP Request Helpers
// ====================
impl HttpDashboardApi {
  /// `{base}/api/{segments...}`, each segment percent-encoded
  fn url_for(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.config.api_root())
      .map_err(|e| StoreError::validation("base_url", e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|_| StoreError::validation("base_url", "URL cannot carry a path"))?
      .extend(segments);
    Ok(url)
  }

  async fn execute_with_timeout(
    &self,
    method: HttpMethod,
    endpoint: &str,
    request: RequestBuilder,
  ) -> Result<Response> {
    debug!(%method, endpoint, "sending request");

    match timeout(Duration::from_secs(self.config.timeout_secs), request.send()).await {
      Ok(Ok(response)) => Ok(response),
      Ok(Err(e)) => Err(StoreError::network(format!("{method} {endpoint} failed: {e}"))),
      Err(_) => Err(StoreError::network(format!(
        "{method} {endpoint} timed out after {}s",
        self.config.timeout_secs
      ))),
    }
  }

  /// Helper to make a GET request and return parsed response data
  async fn get_json<R>(&self, segments: &[&str]) -> Result<R>
  where
    R: DeserializeOwned,
  {
    let endpoint = format!("/{}", segments.join("/"));
    let url = self.url_for(segments)?;
    let response =
      self.execute_with_timeout(HttpMethod::Get, &endpoint, self.client.get(url)).await?;

    parse_response(response, HttpMethod::Get, &endpoint).await
  }

  /// Helper to make a POST request with JSON body and return parsed response data
  async fn post_json<T, R>(&self, segments: &[&str], request: &T) -> Result<R>
  where
    T: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let endpoint = format!("/{}", segments.join("/"));
    let url = self.url_for(segments)?;
    let response = self
      .execute_with_timeout(HttpMethod::Post, &endpoint, self.client.post(url).json(request))
      .await?;

    parse_response(response, HttpMethod::Post, &endpoint).await
  }

  /// Helper to make a body-less POST with query parameters
  async fn post_query<R>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<R>
  where
    R: DeserializeOwned,
  {
    let endpoint = format!("/{}", segments.join("/"));
    let url = self.url_for(segments)?;
    let response = self
      .execute_with_timeout(HttpMethod::Post, &endpoint, self.client.post(url).query(query))
      .await?;

    parse_response(response, HttpMethod::Post, &endpoint).await
  }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
  async fn list_students(&self) -> Result<Vec<Student>> {
    let envelope: StudentsEnvelope = self.get_json(&["students"]).await?;
    Ok(envelope.students)
  }

  async fn get_student(&self, student_id: &str) -> Result<StudentDetail> {
    self.get_json(&["students", student_id]).await
  }

  async fn add_student(&self, student: &NewStudent) -> Result<StudentCreated> {
    self.post_json(&["students"], student).await
  }

  async fn get_stats(&self) -> Result<Stats> {
    self.get_json(&["stats"]).await
  }

  async fn get_model_metrics(&self) -> Result<ModelMetrics> {
    let metrics: ModelMetrics = self.get_json(&["model", "metrics"]).await?;
    Ok(metrics.normalized())
  }

  async fn train_model(&self) -> Result<ModelMetrics> {
    let envelope: TrainEnvelope = self.post_query(&["model", "train"], &[]).await?;
    Ok(envelope.metrics.normalized())
  }

  async fn generate_dataset(&self, n_samples: u32) -> Result<DatasetGenerated> {
    self.post_query(&["dataset", "generate"], &[("n_samples", n_samples.to_string())]).await
  }

  async fn predict_batch(&self) -> Result<BatchPredicted> {
    self.post_query(&["predict", "batch"], &[]).await
  }

  async fn predict_student(&self, student: &NewStudent) -> Result<Prediction> {
    self.post_json(&["predict"], student).await
  }

  async fn list_alerts(&self) -> Result<Vec<Alert>> {
    let envelope: AlertsEnvelope = self.get_json(&["alerts"]).await?;
    Ok(envelope.alerts)
  }

  async fn send_alert(&self, alert: &AlertRequest) -> Result<AlertReceipt> {
    self.post_json(&["alerts", "send"], alert).await
  }

  async fn create_intervention(
    &self,
    intervention: &InterventionRequest,
  ) -> Result<InterventionRecorded> {
    self.post_json(&["interventions"], intervention).await
  }

  async fn training_count(&self) -> Result<u64> {
    let count: TrainingCount = self.get_json(&["training", "count"]).await?;
    Ok(count.count)
  }
}
