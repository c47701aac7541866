use async_trait::async_trait;

use crate::error::Result;

pub mod http;
pub mod types;

pub use http::HttpDashboardApi;
pub use types::{
  Alert, AlertReceipt, AlertRequest, BatchPredicted, DatasetGenerated, EducationLevel,
  FeatureImportance, IncomeLevel, Intervention, InterventionRecorded, InterventionRequest,
  InterventionType, ModelMetrics, NewStudent, Prediction, RiskDistribution, RiskLevel,
  SmsDelivery, Stats, Student, StudentCreated, StudentDetail,
};

/// Seam between the store and the prediction backend
///
/// One method per endpoint. Implementations classify failures into
/// `StoreError::Network` / `StoreError::Server`; they never validate payloads,
/// that happens before a call is made.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
  /// `GET /students`
  async fn list_students(&self) -> Result<Vec<Student>>;

  /// `GET /students/{id}`
  async fn get_student(&self, student_id: &str) -> Result<StudentDetail>;

  /// `POST /students`
  async fn add_student(&self, student: &NewStudent) -> Result<StudentCreated>;

  /// `GET /stats`
  async fn get_stats(&self) -> Result<Stats>;

  /// `GET /model/metrics`, 404 until a model has been trained
  async fn get_model_metrics(&self) -> Result<ModelMetrics>;

  /// `POST /model/train`
  async fn train_model(&self) -> Result<ModelMetrics>;

  /// `POST /dataset/generate?n_samples={n}`
  async fn generate_dataset(&self, n_samples: u32) -> Result<DatasetGenerated>;

  /// `POST /predict/batch`
  async fn predict_batch(&self) -> Result<BatchPredicted>;

  /// `POST /predict`
  async fn predict_student(&self, student: &NewStudent) -> Result<Prediction>;

  /// `GET /alerts`
  async fn list_alerts(&self) -> Result<Vec<Alert>>;

  /// `POST /alerts/send`
  async fn send_alert(&self, alert: &AlertRequest) -> Result<AlertReceipt>;

  /// `POST /interventions`
  async fn create_intervention(
    &self,
    intervention: &InterventionRequest,
  ) -> Result<InterventionRecorded>;

  /// `GET /training/count`
  async fn training_count(&self) -> Result<u64>;
}
