//! Wire types for the prediction API
//!
//! Records mirror the JSON the backend emits. Decoding is lenient where the
//! backend is loose (flag encodings, timestamp formats, unknown labels) so a
//! single odd record never fails a whole collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

// Risk Levels
// ===========

/// Categorical dropout-risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
  High,
  Medium,
  Low,
  #[default]
  Unknown,
}

impl RiskLevel {
  /// Known levels, most severe first
  pub const RANKED: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

  /// Class order the model reports its confusion matrix in
  pub const CONFUSION_ORDER: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Low, RiskLevel::Medium];

  pub fn as_str(&self) -> &'static str {
    match self {
      RiskLevel::High => "High",
      RiskLevel::Medium => "Medium",
      RiskLevel::Low => "Low",
      RiskLevel::Unknown => "Unknown",
    }
  }

  /// Case-insensitive; anything unrecognised is `Unknown`
  pub fn parse(label: &str) -> Self {
    match label.trim().to_ascii_lowercase().as_str() {
      "high" => RiskLevel::High,
      "medium" => RiskLevel::Medium,
      "low" => RiskLevel::Low,
      _ => RiskLevel::Unknown,
    }
  }

  pub fn is_known(&self) -> bool {
    *self != RiskLevel::Unknown
  }
}

impl From<String> for RiskLevel {
  fn from(label: String) -> Self {
    RiskLevel::parse(&label)
  }
}

impl From<RiskLevel> for String {
  fn from(level: RiskLevel) -> Self {
    level.as_str().to_string()
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Demographics
// ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IncomeLevel {
  Low,
  Medium,
  High,
  #[default]
  #[serde(other)]
  Unknown,
}

impl FromStr for IncomeLevel {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "low" => Ok(IncomeLevel::Low),
      "medium" => Ok(IncomeLevel::Medium),
      "high" => Ok(IncomeLevel::High),
      _ => Err(StoreError::validation(
        "family_income_level",
        format!("'{s}' is not one of Low, Medium, High"),
      )),
    }
  }
}

impl fmt::Display for IncomeLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      IncomeLevel::Low => "Low",
      IncomeLevel::Medium => "Medium",
      IncomeLevel::High => "High",
      IncomeLevel::Unknown => "Unknown",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EducationLevel {
  #[serde(rename = "No Education")]
  NoEducation,
  Primary,
  Secondary,
  Higher,
  #[default]
  #[serde(other)]
  Unknown,
}

impl FromStr for EducationLevel {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key: String =
      s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_lowercase();
    match key.as_str() {
      "noeducation" | "none" => Ok(EducationLevel::NoEducation),
      "primary" => Ok(EducationLevel::Primary),
      "secondary" => Ok(EducationLevel::Secondary),
      "higher" => Ok(EducationLevel::Higher),
      _ => Err(StoreError::validation(
        "parents_education_level",
        format!("'{s}' is not one of No Education, Primary, Secondary, Higher"),
      )),
    }
  }
}

impl fmt::Display for EducationLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      EducationLevel::NoEducation => "No Education",
      EducationLevel::Primary => "Primary",
      EducationLevel::Secondary => "Secondary",
      EducationLevel::Higher => "Higher",
      EducationLevel::Unknown => "Unknown",
    };
    f.write_str(label)
  }
}

// Students
// ========

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Student {
  pub student_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone_number: Option<String>,
  pub age: u32,
  pub attendance_percentage: f64,
  pub average_marks: f64,
  pub absences_per_month: u32,
  pub distance_to_school_km: f64,
  pub family_income_level: IncomeLevel,
  pub parents_education_level: EducationLevel,
  #[serde(with = "yes_no")]
  pub health_issues: bool,
  #[serde(with = "int_flag")]
  pub child_labor: bool,
  #[serde(with = "int_flag")]
  pub has_sibling_dropout: bool,
  #[serde(deserialize_with = "risk_label::deserialize", skip_serializing_if = "Option::is_none")]
  pub predicted_risk: Option<RiskLevel>,
  #[serde(deserialize_with = "risk_label::deserialize", skip_serializing_if = "Option::is_none")]
  pub dropout_risk: Option<RiskLevel>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub risk_factors: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub confidence: Option<f64>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub probabilities: BTreeMap<String, f64>,
  #[serde(with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
  pub predicted_at: Option<DateTime<Utc>>,
}

impl Student {
  /// Any `predicted_risk`, even Unknown, wins over the legacy `dropout_risk`;
  /// neither means Unknown
  pub fn effective_risk(&self) -> RiskLevel {
    self.predicted_risk.or(self.dropout_risk).unwrap_or(RiskLevel::Unknown)
  }

  pub fn has_prediction(&self) -> bool {
    self.predicted_risk.is_some_and(|risk| risk.is_known())
  }
}

/// A student together with the interventions recorded against them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetail {
  pub student: Student,
  #[serde(default)]
  pub interventions: Vec<Intervention>,
}

// Interventions
// =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterventionType {
  Counselling,
  #[serde(rename = "Financial Aid")]
  FinancialAid,
  #[serde(rename = "Health Support")]
  HealthSupport,
  #[serde(rename = "Academic Tutoring")]
  AcademicTutoring,
  #[serde(rename = "Parent Meeting")]
  ParentMeeting,
  #[serde(other)]
  Other,
}

impl InterventionType {
  pub const ALL: [InterventionType; 5] = [
    InterventionType::Counselling,
    InterventionType::FinancialAid,
    InterventionType::HealthSupport,
    InterventionType::AcademicTutoring,
    InterventionType::ParentMeeting,
  ];

  pub fn label(&self) -> &'static str {
    match self {
      InterventionType::Counselling => "Counselling",
      InterventionType::FinancialAid => "Financial Aid",
      InterventionType::HealthSupport => "Health Support",
      InterventionType::AcademicTutoring => "Academic Tutoring",
      InterventionType::ParentMeeting => "Parent Meeting",
      InterventionType::Other => "Other",
    }
  }
}

impl FromStr for InterventionType {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key: String =
      s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_lowercase();
    match key.as_str() {
      "counselling" | "counseling" => Ok(InterventionType::Counselling),
      "financialaid" => Ok(InterventionType::FinancialAid),
      "healthsupport" => Ok(InterventionType::HealthSupport),
      "academictutoring" | "tutoring" => Ok(InterventionType::AcademicTutoring),
      "parentmeeting" => Ok(InterventionType::ParentMeeting),
      _ => {
        let known: Vec<&str> = InterventionType::ALL.iter().map(|t| t.label()).collect();
        Err(StoreError::validation(
          "intervention_type",
          format!("'{s}' is not one of {}", known.join(", ")),
        ))
      }
    }
  }
}

impl fmt::Display for InterventionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
  pub student_id: String,
  pub intervention_type: InterventionType,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default, with = "lenient_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

// Alerts
// ======

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alert {
  #[serde(default)]
  pub id: Option<String>,
  pub student_id: String,
  #[serde(default)]
  pub risk_level: RiskLevel,
  #[serde(default)]
  pub phone_number: String,
  #[serde(default)]
  pub message: String,
  #[serde(default, alias = "sms_status")]
  pub status: Option<String>,
  #[serde(default, alias = "sms_sid")]
  pub delivery_id: Option<String>,
  #[serde(default, alias = "created_at", with = "lenient_timestamp")]
  pub sent_at: Option<DateTime<Utc>>,
}

// Model and Stats
// ===============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
  pub feature: String,
  pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
  pub accuracy: f64,
  #[serde(default)]
  pub feature_importance: Vec<FeatureImportance>,
  #[serde(default)]
  pub confusion_matrix: Option<Vec<Vec<u64>>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub classification_report: Option<serde_json::Value>,
}

impl ModelMetrics {
  /// Sorts feature importance descending; the server is trusted for nothing else
  pub fn normalized(mut self) -> Self {
    self.feature_importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskDistribution {
  #[serde(rename = "High")]
  pub high: u64,
  #[serde(rename = "Medium")]
  pub medium: u64,
  #[serde(rename = "Low")]
  pub low: u64,
}

impl RiskDistribution {
  pub fn get(&self, level: RiskLevel) -> u64 {
    match level {
      RiskLevel::High => self.high,
      RiskLevel::Medium => self.medium,
      RiskLevel::Low => self.low,
      RiskLevel::Unknown => 0,
    }
  }

  pub fn total(&self) -> u64 {
    self.high + self.medium + self.low
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
  pub total_students: u64,
  pub risk_distribution: RiskDistribution,
  pub average_attendance: f64,
  pub average_marks: f64,
  pub has_predictions: bool,
}

/// Result of scoring a single, unsaved student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
  #[serde(default)]
  pub student_id: Option<String>,
  pub predicted_risk: RiskLevel,
  #[serde(default)]
  pub confidence: f64,
  #[serde(default)]
  pub probabilities: BTreeMap<String, f64>,
  #[serde(default)]
  pub risk_factors: Vec<String>,
}

// Request Payloads
// ================

/// A student record entered by hand, before the server assigns anything
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudent {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub student_id: Option<String>,
  pub age: u32,
  pub attendance_percentage: f64,
  pub average_marks: f64,
  pub absences_per_month: u32,
  pub distance_to_school_km: f64,
  pub family_income_level: IncomeLevel,
  pub parents_education_level: EducationLevel,
  #[serde(with = "yes_no")]
  pub health_issues: bool,
  #[serde(with = "int_flag")]
  pub child_labor: bool,
  #[serde(with = "int_flag")]
  pub has_sibling_dropout: bool,
}

impl Default for NewStudent {
  fn default() -> Self {
    Self {
      phone_number: None,
      student_id: None,
      age: 0,
      attendance_percentage: 0.0,
      average_marks: 0.0,
      absences_per_month: 0,
      distance_to_school_km: 0.0,
      family_income_level: IncomeLevel::Low,
      parents_education_level: EducationLevel::Primary,
      health_issues: false,
      child_labor: false,
      has_sibling_dropout: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRequest {
  pub student_id: String,
  pub risk_level: RiskLevel,
  pub phone_number: String,
  pub message: String,
}

impl AlertRequest {
  /// Alert for a student at their current effective risk, with the standard message
  pub fn for_student(student: &Student, phone_number: impl Into<String>) -> Self {
    Self {
      student_id: student.student_id.clone(),
      risk_level: student.effective_risk(),
      phone_number: phone_number.into(),
      message: crate::views::alert_message(student),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionRequest {
  pub student_id: String,
  pub intervention_type: InterventionType,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

// Response Envelopes
// ==================

#[derive(Debug, Deserialize)]
pub(crate) struct StudentsEnvelope {
  #[serde(default)]
  pub students: Vec<Student>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlertsEnvelope {
  #[serde(default)]
  pub alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrainEnvelope {
  pub metrics: ModelMetrics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrainingCount {
  #[serde(default)]
  pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetGenerated {
  #[serde(default, alias = "total_students")]
  pub total_records: u64,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredicted {
  #[serde(default)]
  pub total_predictions: u64,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCreated {
  #[serde(default)]
  pub student_id: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SmsDelivery {
  #[serde(default)]
  pub sid: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertReceipt {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub sms: Option<SmsDelivery>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterventionRecorded {
  #[serde(default)]
  pub message: Option<String>,
}

// Serde Helpers
// =============

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseFlag {
  Flag(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

impl LooseFlag {
  fn truthy(self) -> bool {
    match self {
      LooseFlag::Flag(flag) => flag,
      LooseFlag::Int(n) => n != 0,
      LooseFlag::Float(n) => n != 0.0,
      LooseFlag::Text(text) => {
        matches!(text.trim().to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1")
      }
    }
  }
}

/// Booleans carried as `"Yes"` / `"No"`
mod yes_no {
  use super::LooseFlag;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "Yes" } else { "No" })
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<LooseFlag>::deserialize(deserializer)?.is_some_and(LooseFlag::truthy))
  }
}

/// Booleans carried as `0` / `1`
mod int_flag {
  use super::LooseFlag;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<LooseFlag>::deserialize(deserializer)?.is_some_and(LooseFlag::truthy))
  }
}

/// Risk labels where a null or blank string means no label at all
mod risk_label {
  use super::RiskLevel;
  use serde::{Deserialize, Deserializer};

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<RiskLevel>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|label| !label.trim().is_empty()).map(RiskLevel::from))
  }
}

/// RFC 3339 timestamps, falling back to offset-less ISO 8601 read as UTC
mod lenient_timestamp {
  use chrono::{DateTime, NaiveDateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(timestamp) => serializer.serialize_str(&timestamp.to_rfc3339()),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse))
  }

  pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
      return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
  }
}
