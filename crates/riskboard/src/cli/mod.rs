//! Terminal front end
//!
//! One subcommand per dashboard page. Handlers only talk to the store.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;

use crate::api::{EducationLevel, HttpDashboardApi, IncomeLevel, InterventionType, NewStudent};
use crate::command::DEFAULT_SAMPLE_COUNT;
use crate::config::{ClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::store::RemoteCollectionStore;
use crate::views::RiskFilter;

pub mod alerts;
pub mod dashboard;
pub mod detail;
pub mod display;
pub mod entry;
pub mod insights;
pub mod setup;
pub mod students;

#[derive(Parser)]
#[command(name = "riskboard")]
#[command(about = "Student dropout-risk dashboard - browse predictions, send alerts, run setup")]
#[command(version)]
pub struct Cli {
  /// Prediction backend base URL, without the /api suffix
  #[arg(long, env = "RISKBOARD_BACKEND_URL", global = true)]
  pub backend_url: Option<String>,

  /// Request timeout in seconds
  #[arg(long, env = "RISKBOARD_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
  pub timeout_secs: u64,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
  /// List students, optionally searched and filtered by risk
  Students {
    /// Case-insensitive substring of the student ID
    #[arg(short, long, default_value = "")]
    search: String,
    /// all, high, medium or low
    #[arg(short, long, default_value = "all")]
    risk: RiskFilter,
  },
  /// Show one student with their interventions
  Student {
    student_id: String,
  },
  /// Risk overview: totals, averages and distribution
  Dashboard,
  /// Model accuracy, feature importance and confusion matrix
  Insights,
  /// Show the alert log
  Alerts,
  /// Send an SMS alert for a student
  Alert {
    student_id: String,
    /// Destination number; defaults to the student's own
    #[arg(short, long)]
    phone: Option<String>,
    /// Message body; defaults to the standard risk message
    #[arg(short, long)]
    message: Option<String>,
  },
  /// Record an intervention for a student
  Intervene {
    student_id: String,
    /// Counselling, Financial Aid, Health Support, Academic Tutoring or Parent Meeting
    #[arg(short, long)]
    kind: InterventionType,
    #[arg(short, long)]
    notes: Option<String>,
  },
  /// Three-step setup: generate, train, predict
  Setup {
    #[command(subcommand)]
    action: Option<SetupAction>,
  },
  /// Add a student record by hand
  AddStudent(StudentArgs),
  /// Score a student record without saving it
  Score(StudentArgs),
}

#[derive(Subcommand, Clone, Copy)]
pub enum SetupAction {
  /// Show which steps are available
  Status,
  /// Step 1: generate the synthetic training dataset
  Generate {
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    samples: u32,
  },
  /// Step 2: train the model
  Train,
  /// Step 3: predict risk for every student
  Predict,
}

#[derive(Args, Clone)]
pub struct StudentArgs {
  /// Contact number (required when adding)
  #[arg(long)]
  pub phone: Option<String>,
  /// Leave empty to let the server assign one
  #[arg(long)]
  pub student_id: Option<String>,
  #[arg(long)]
  pub age: u32,
  /// Attendance percentage (0-100)
  #[arg(long)]
  pub attendance: f64,
  /// Average marks (0-100)
  #[arg(long)]
  pub marks: f64,
  #[arg(long, default_value_t = 0)]
  pub absences: u32,
  /// Distance to school in km
  #[arg(long, default_value_t = 0.0)]
  pub distance: f64,
  /// Low, Medium or High
  #[arg(long, default_value = "Low")]
  pub income: IncomeLevel,
  /// No Education, Primary, Secondary or Higher
  #[arg(long, default_value = "Primary")]
  pub education: EducationLevel,
  #[arg(long)]
  pub health_issues: bool,
  #[arg(long)]
  pub child_labor: bool,
  #[arg(long)]
  pub sibling_dropout: bool,
}

impl From<StudentArgs> for NewStudent {
  fn from(args: StudentArgs) -> Self {
    NewStudent {
      phone_number: args.phone,
      student_id: args.student_id,
      age: args.age,
      attendance_percentage: args.attendance,
      average_marks: args.marks,
      absences_per_month: args.absences,
      distance_to_school_km: args.distance,
      family_income_level: args.income,
      parents_education_level: args.education,
      health_issues: args.health_issues,
      child_labor: args.child_labor,
      has_sibling_dropout: args.sibling_dropout,
    }
  }
}

/// Build the store from the global flags and dispatch
pub async fn run(cli: Cli) -> Result<()> {
  let config = match cli.backend_url.as_deref() {
    Some(url) => ClientConfig::new(url, cli.timeout_secs)?,
    None => ClientConfig::from_env()?,
  };
  let api = HttpDashboardApi::new(config)?;
  let store = RemoteCollectionStore::new(Arc::new(api));

  match cli.command {
    Commands::Students { search, risk } => students::handle(&store, search, risk).await,
    Commands::Student { student_id } => detail::handle(&store, &student_id).await,
    Commands::Dashboard => dashboard::handle(&store).await,
    Commands::Insights => insights::handle(&store).await,
    Commands::Alerts => alerts::handle(&store).await,
    Commands::Alert { student_id, phone, message } => {
      alerts::send(&store, &student_id, phone, message).await
    }
    Commands::Intervene { student_id, kind, notes } => {
      detail::intervene(&store, &student_id, kind, notes).await
    }
    Commands::Setup { action } => setup::handle(&store, action.unwrap_or(SetupAction::Status)).await,
    Commands::AddStudent(args) => entry::add(&store, args.into()).await,
    Commands::Score(args) => entry::score(&store, args.into()).await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::RiskLevel;

  #[test]
  fn test_students_flags() {
    let cli = Cli::try_parse_from([
      "riskboard",
      "--backend-url",
      "http://localhost:8000",
      "students",
      "--search",
      "stu",
      "--risk",
      "HIGH",
    ])
    .unwrap();

    match cli.command {
      Commands::Students { search, risk } => {
        assert_eq!(search, "stu");
        assert_eq!(risk, RiskFilter::Only(RiskLevel::High));
      }
      _ => panic!("expected students command"),
    }
  }

  #[test]
  fn test_rejects_unknown_risk() {
    let parsed = Cli::try_parse_from(["riskboard", "students", "--risk", "severe"]);
    assert!(parsed.is_err());
  }

  #[test]
  fn test_setup_generate_default_samples() {
    let cli = Cli::try_parse_from(["riskboard", "setup", "generate"]).unwrap();
    match cli.command {
      Commands::Setup { action: Some(SetupAction::Generate { samples }) } => {
        assert_eq!(samples, DEFAULT_SAMPLE_COUNT)
      }
      _ => panic!("expected setup generate"),
    }
  }

  #[test]
  fn test_student_args_convert() {
    let cli = Cli::try_parse_from([
      "riskboard",
      "add-student",
      "--phone",
      "+911234567890",
      "--age",
      "14",
      "--attendance",
      "55",
      "--marks",
      "40",
      "--education",
      "no education",
      "--child-labor",
    ])
    .unwrap();

    let Commands::AddStudent(args) = cli.command else {
      panic!("expected add-student");
    };
    let student = NewStudent::from(args);
    assert_eq!(student.parents_education_level, EducationLevel::NoEducation);
    assert_eq!(student.family_income_level, IncomeLevel::Low);
    assert!(student.child_labor);
    assert!(!student.health_issues);
  }

  #[test]
  fn test_intervention_kind_parses_label() {
    let cli =
      Cli::try_parse_from(["riskboard", "intervene", "STU001", "--kind", "Financial Aid"]).unwrap();
    let Commands::Intervene { kind, .. } = cli.command else {
      panic!("expected intervene");
    };
    assert_eq!(kind, InterventionType::FinancialAid);
  }
}
