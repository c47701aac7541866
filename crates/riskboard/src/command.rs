//! Mutating operations and the refreshes they trigger

use std::fmt;

use crate::api::{
  AlertReceipt, AlertRequest, BatchPredicted, DatasetGenerated, InterventionRecorded,
  InterventionRequest, ModelMetrics, NewStudent, StudentCreated,
};
use crate::error::{Result, StoreError};

/// Dataset size the setup workflow asks for
pub const DEFAULT_SAMPLE_COUNT: u32 = 150;

/// The remote collections the store keeps snapshots of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
  Students,
  Stats,
  ModelMetrics,
  Alerts,
}

impl Collection {
  pub const ALL: [Collection; 4] =
    [Collection::Students, Collection::Stats, Collection::ModelMetrics, Collection::Alerts];

  pub(crate) fn index(self) -> usize {
    self as usize
  }

  pub fn name(&self) -> &'static str {
    match self {
      Collection::Students => "students",
      Collection::Stats => "stats",
      Collection::ModelMetrics => "model_metrics",
      Collection::Alerts => "alerts",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
  GenerateDataset,
  TrainModel,
  PredictBatch,
  AddStudent,
  SendAlert,
  CreateIntervention,
}

impl CommandKind {
  /// Collections refreshed, in order, after the command succeeds
  pub fn cascade(&self) -> &'static [Collection] {
    match self {
      CommandKind::GenerateDataset => &[Collection::Students, Collection::Stats],
      CommandKind::TrainModel => &[Collection::ModelMetrics],
      CommandKind::PredictBatch => &[Collection::Students, Collection::Stats],
      CommandKind::AddStudent => &[Collection::Students],
      // alert log and student detail are re-fetched by whoever shows them
      CommandKind::SendAlert => &[],
      CommandKind::CreateIntervention => &[],
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      CommandKind::GenerateDataset => "generate_dataset",
      CommandKind::TrainModel => "train_model",
      CommandKind::PredictBatch => "predict_batch",
      CommandKind::AddStudent => "add_student",
      CommandKind::SendAlert => "send_alert",
      CommandKind::CreateIntervention => "create_intervention",
    }
  }
}

impl fmt::Display for CommandKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  GenerateDataset { n_samples: u32 },
  TrainModel,
  PredictBatch,
  AddStudent(NewStudent),
  SendAlert(AlertRequest),
  CreateIntervention(InterventionRequest),
}

impl Command {
  pub fn kind(&self) -> CommandKind {
    match self {
      Command::GenerateDataset { .. } => CommandKind::GenerateDataset,
      Command::TrainModel => CommandKind::TrainModel,
      Command::PredictBatch => CommandKind::PredictBatch,
      Command::AddStudent(_) => CommandKind::AddStudent,
      Command::SendAlert(_) => CommandKind::SendAlert,
      Command::CreateIntervention(_) => CommandKind::CreateIntervention,
    }
  }

  /// Pre-flight checks; a command that fails here never reaches the server
  pub fn validate(&self) -> Result<()> {
    match self {
      Command::GenerateDataset { n_samples } => {
        if *n_samples == 0 {
          return Err(StoreError::validation("n_samples", "Dataset size must be at least 1"));
        }
        Ok(())
      }
      Command::TrainModel | Command::PredictBatch => Ok(()),
      Command::AddStudent(student) => {
        require_text("phone_number", student.phone_number.as_deref(), "Phone number is required")?;
        validate_record(student)
      }
      Command::SendAlert(alert) => {
        require_text("student_id", Some(&alert.student_id), "Student ID is required")?;
        require_text("phone_number", Some(&alert.phone_number), "Phone number is required")?;
        require_text("message", Some(&alert.message), "Alert message is required")
      }
      Command::CreateIntervention(intervention) => {
        require_text("student_id", Some(&intervention.student_id), "Student ID is required")
      }
    }
  }
}

fn require_text(field: &str, value: Option<&str>, message: &str) -> Result<()> {
  match value {
    Some(text) if !text.trim().is_empty() => Ok(()),
    _ => Err(StoreError::validation(field, message)),
  }
}

/// Range checks shared by manual entry and single-record scoring
pub fn validate_record(student: &NewStudent) -> Result<()> {
  if student.age == 0 {
    return Err(StoreError::validation("age", "Age must be greater than zero"));
  }
  percentage("attendance_percentage", student.attendance_percentage)?;
  percentage("average_marks", student.average_marks)?;
  if !student.distance_to_school_km.is_finite() || student.distance_to_school_km < 0.0 {
    return Err(StoreError::validation(
      "distance_to_school_km",
      "Distance must be a non-negative number",
    ));
  }
  Ok(())
}

fn percentage(field: &str, value: f64) -> Result<()> {
  if (0.0..=100.0).contains(&value) {
    Ok(())
  } else {
    Err(StoreError::validation(field, format!("{value} is outside 0-100")))
  }
}

/// What a successful command returned
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
  DatasetGenerated(DatasetGenerated),
  ModelTrained(ModelMetrics),
  BatchPredicted(BatchPredicted),
  StudentAdded(StudentCreated),
  AlertSent(AlertReceipt),
  InterventionRecorded(InterventionRecorded),
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{InterventionType, RiskLevel};

  fn valid_student() -> NewStudent {
    NewStudent {
      phone_number: Some("+919876543210".to_string()),
      age: 15,
      attendance_percentage: 72.5,
      average_marks: 61.0,
      absences_per_month: 4,
      distance_to_school_km: 3.2,
      ..NewStudent::default()
    }
  }

  #[test]
  fn test_cascade_table() {
    assert_eq!(
      CommandKind::GenerateDataset.cascade(),
      &[Collection::Students, Collection::Stats]
    );
    assert_eq!(CommandKind::TrainModel.cascade(), &[Collection::ModelMetrics]);
    assert_eq!(CommandKind::PredictBatch.cascade(), &[Collection::Students, Collection::Stats]);
    assert_eq!(CommandKind::AddStudent.cascade(), &[Collection::Students]);
    assert!(CommandKind::SendAlert.cascade().is_empty());
    assert!(CommandKind::CreateIntervention.cascade().is_empty());
  }

  #[test]
  fn test_add_student_requires_phone() {
    let mut student = valid_student();
    student.phone_number = None;
    let err = Command::AddStudent(student.clone()).validate().unwrap_err();
    assert_eq!(err, StoreError::validation("phone_number", "Phone number is required"));

    student.phone_number = Some("   ".to_string());
    assert!(Command::AddStudent(student).validate().unwrap_err().is_validation());
  }

  #[test]
  fn test_add_student_range_checks() {
    let mut student = valid_student();
    student.attendance_percentage = 140.0;
    let err = Command::AddStudent(student).validate().unwrap_err();
    assert!(matches!(err, StoreError::Validation { ref field, .. } if field == "attendance_percentage"));

    assert!(Command::AddStudent(valid_student()).validate().is_ok());
  }

  #[test]
  fn test_generate_rejects_empty_dataset() {
    assert!(Command::GenerateDataset { n_samples: 0 }.validate().is_err());
    assert!(Command::GenerateDataset { n_samples: DEFAULT_SAMPLE_COUNT }.validate().is_ok());
  }

  #[test]
  fn test_send_alert_requires_phone() {
    let alert = AlertRequest {
      student_id: "STU001".to_string(),
      risk_level: RiskLevel::High,
      phone_number: String::new(),
      message: "hello".to_string(),
    };
    assert!(Command::SendAlert(alert).validate().unwrap_err().is_validation());
  }

  #[test]
  fn test_intervention_requires_student() {
    let intervention = InterventionRequest {
      student_id: " ".to_string(),
      intervention_type: InterventionType::Counselling,
      notes: None,
    };
    assert!(Command::CreateIntervention(intervention).validate().is_err());
  }
}
