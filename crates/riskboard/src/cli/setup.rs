use anyhow::Result;

use super::{display, SetupAction};
use crate::command::CommandOutcome;
use crate::readiness::{SetupStep, SetupWorkflow, SystemReadiness};
use crate::store::RemoteCollectionStore;

pub async fn handle(store: &RemoteCollectionStore, action: SetupAction) -> Result<()> {
  let mut workflow = SetupWorkflow::mount(store).await?;

  let step = match action {
    SetupAction::Status => {
      render(&workflow.readiness());
      return Ok(());
    }
    SetupAction::Generate { samples } => {
      workflow = workflow.with_sample_count(samples);
      SetupStep::GenerateDataset
    }
    SetupAction::Train => SetupStep::TrainModel,
    SetupAction::Predict => SetupStep::RunPredictions,
  };

  match workflow.run(step).await {
    Ok(outcome) => report(&outcome),
    Err(err) => match err.applied_outcome() {
      Some(outcome) => {
        report(outcome);
        display::warn(&err.to_string());
      }
      None => return Err(err.into()),
    },
  }
  render(&workflow.readiness());
  Ok(())
}

fn report(outcome: &CommandOutcome) {
  match outcome {
    CommandOutcome::DatasetGenerated(generated) => {
      display::success(&format!("Generated {} student records", generated.total_records))
    }
    CommandOutcome::ModelTrained(metrics) => display::success(&format!(
      "Model trained with {} accuracy",
      display::percent(metrics.accuracy)
    )),
    CommandOutcome::BatchPredicted(batch) => display::success(&format!(
      "Predictions completed for {} students",
      batch.total_predictions
    )),
    _ => {}
  }
}

fn render(readiness: &SystemReadiness) {
  display::announce("Setup");
  println!("Training rows: {}", readiness.training_rows);
  println!("Students:      {}", readiness.student_count);
  println!("Model trained: {}", display::flag(readiness.model_trained));
  println!();

  for step in SetupStep::ALL {
    let state = if readiness.is_done(step) {
      "done"
    } else if readiness.is_enabled(step) {
      "ready"
    } else {
      "locked"
    };
    println!("  [{state:^6}] {step}");
  }

  match readiness.next_step() {
    Some(step) => display::info(&format!("Next: {step}")),
    None => display::info("Add students with `riskboard add-student` before running predictions"),
  }
}
