use anyhow::Result;

use super::display;
use crate::api::NewStudent;
use crate::command::{Command, CommandOutcome};
use crate::store::RemoteCollectionStore;

pub async fn add(store: &RemoteCollectionStore, student: NewStudent) -> Result<()> {
  if let CommandOutcome::StudentAdded(created) =
    store.run_command(Command::AddStudent(student)).await?
  {
    let id = created.student_id.as_deref().unwrap_or("(assigned by server)");
    display::success(&format!("Added student {id}"));
  }

  display::info(&format!("{} students on record", store.students().len()));
  Ok(())
}

pub async fn score(store: &RemoteCollectionStore, student: NewStudent) -> Result<()> {
  let prediction = store.predict_student(&student).await?;

  display::announce("Risk Prediction");
  println!("Predicted risk: {}", display::risk_badge(prediction.predicted_risk));
  println!("Confidence:     {}", display::percent(prediction.confidence));

  if !prediction.probabilities.is_empty() {
    display::section("Class probabilities");
    for (class, probability) in &prediction.probabilities {
      println!("  {:<7} {}", class, display::percent(*probability));
    }
  }

  if !prediction.risk_factors.is_empty() {
    display::section("Risk factors");
    for factor in &prediction.risk_factors {
      println!("  - {factor}");
    }
  }
  Ok(())
}
