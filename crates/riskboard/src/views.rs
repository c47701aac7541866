//! Derived views over store snapshots
//!
//! Everything here is a pure function of a snapshot. Nothing is cached:
//! callers recompute on every change notification.

use std::fmt;
use std::str::FromStr;

use crate::api::{Alert, ModelMetrics, RiskDistribution, RiskLevel, Stats, Student};
use crate::error::StoreError;

const FALLBACK_FACTORS: &str = "various risk factors";

// Student Search/Filter
// =====================

/// Risk filter for the student list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskFilter {
  #[default]
  All,
  Only(RiskLevel),
}

impl RiskFilter {
  /// Unknown-risk students never match a specific level
  pub fn matches(&self, risk: RiskLevel) -> bool {
    match self {
      RiskFilter::All => true,
      RiskFilter::Only(level) => risk.is_known() && risk == *level,
    }
  }
}

impl FromStr for RiskFilter {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
      return Ok(RiskFilter::All);
    }

    match RiskLevel::parse(s) {
      RiskLevel::Unknown => {
        Err(StoreError::validation("risk", format!("'{s}' is not one of all, high, medium, low")))
      }
      level => Ok(RiskFilter::Only(level)),
    }
  }
}

impl fmt::Display for RiskFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RiskFilter::All => f.write_str("all"),
      RiskFilter::Only(level) => write!(f, "{level}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentQuery {
  /// Case-insensitive substring of the student identifier; empty matches all
  pub search: String,
  pub risk: RiskFilter,
}

impl StudentQuery {
  pub fn new(search: impl Into<String>, risk: RiskFilter) -> Self {
    Self { search: search.into(), risk }
  }

  pub fn matches(&self, student: &Student) -> bool {
    let term = self.search.trim().to_lowercase();
    let id_matches = term.is_empty() || student.student_id.to_lowercase().contains(&term);
    id_matches && self.risk.matches(student.effective_risk())
  }

  /// Fresh order-preserving subset of `students`
  pub fn apply(&self, students: &[Student]) -> Vec<Student> {
    students.iter().filter(|student| self.matches(student)).cloned().collect()
  }
}

// Student Details
// ===============

/// The first `limit` risk-factor labels
pub fn key_risk_factors(student: &Student, limit: usize) -> &[String] {
  let end = student.risk_factors.len().min(limit);
  &student.risk_factors[..end]
}

/// Standard SMS body for a student at their current effective risk
pub fn alert_message(student: &Student) -> String {
  let factors = if student.risk_factors.is_empty() {
    FALLBACK_FACTORS.to_string()
  } else {
    student.risk_factors.join(", ")
  };

  format!(
    "⚠️ Student ID {} is at {} risk of dropout due to {}.",
    student.student_id,
    student.effective_risk(),
    factors
  )
}

// Dashboard
// =========

/// One bar of the risk chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskShare {
  pub level: RiskLevel,
  pub count: u64,
  /// Fraction of all classified students, 0 when there are none
  pub share: f64,
}

/// High, Medium, Low in that order
pub fn risk_chart(distribution: &RiskDistribution) -> Vec<RiskShare> {
  let total = distribution.total();
  RiskLevel::RANKED
    .iter()
    .map(|level| {
      let count = distribution.get(*level);
      let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
      RiskShare { level: *level, count, share }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
  pub total_students: u64,
  pub high_risk: u64,
  pub average_attendance: f64,
  pub average_marks: f64,
  pub has_predictions: bool,
  pub chart: Vec<RiskShare>,
}

impl DashboardSummary {
  pub fn from_stats(stats: &Stats) -> Self {
    Self {
      total_students: stats.total_students,
      high_risk: stats.risk_distribution.high,
      average_attendance: stats.average_attendance,
      average_marks: stats.average_marks,
      has_predictions: stats.has_predictions,
      chart: risk_chart(&stats.risk_distribution),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.total_students == 0
  }
}

// Alerts
// ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertSummary {
  pub total: usize,
  pub high_risk: usize,
}

impl AlertSummary {
  pub fn from_alerts(alerts: &[Alert]) -> Self {
    Self {
      total: alerts.len(),
      high_risk: alerts.iter().filter(|alert| alert.risk_level == RiskLevel::High).count(),
    }
  }
}

// Model Insights
// ==============

#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
  /// 1-based position, most important first
  pub rank: usize,
  pub feature: String,
  pub label: String,
  pub importance: f64,
  /// Share of summed importance, in percent
  pub percent: f64,
}

pub fn feature_ranking(metrics: &ModelMetrics) -> Vec<RankedFeature> {
  let mut features = metrics.feature_importance.clone();
  features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

  let sum: f64 = features.iter().map(|f| f.importance).sum();
  features
    .into_iter()
    .enumerate()
    .map(|(i, f)| RankedFeature {
      rank: i + 1,
      label: feature_label(&f.feature),
      percent: if sum > 0.0 { f.importance / sum * 100.0 } else { 0.0 },
      feature: f.feature,
      importance: f.importance,
    })
    .collect()
}

/// "attendance_percentage" -> "Attendance Percentage"
pub fn feature_label(feature: &str) -> String {
  feature
    .split('_')
    .filter(|word| !word.is_empty())
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionRow {
  pub actual: RiskLevel,
  /// Predicted counts, columns in `RiskLevel::CONFUSION_ORDER`
  pub predicted: Vec<u64>,
}

/// Labelled rows, or `None` unless the matrix is exactly 3x3
pub fn confusion_rows(metrics: &ModelMetrics) -> Option<Vec<ConfusionRow>> {
  let matrix = metrics.confusion_matrix.as_ref()?;
  let order = RiskLevel::CONFUSION_ORDER;
  if matrix.len() != order.len() || matrix.iter().any(|row| row.len() != order.len()) {
    return None;
  }

  Some(
    order
      .iter()
      .zip(matrix)
      .map(|(actual, row)| ConfusionRow { actual: *actual, predicted: row.clone() })
      .collect(),
  )
}
