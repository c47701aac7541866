//! Setup progress: generate a dataset, train a model, run predictions
//!
//! Which steps are available is never tracked locally. It is read back from
//! the backend as one [`SystemReadiness`] value, once when the workflow is
//! mounted and again after every command it runs.

use std::fmt;
use tracing::{info, warn};

use crate::command::{Command, CommandOutcome, DEFAULT_SAMPLE_COUNT};
use crate::error::{Result, StoreError};
use crate::store::RemoteCollectionStore;

/// Backend setup state as of the last probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemReadiness {
  /// Rows in the synthetic training set
  pub training_rows: u64,
  /// Students available for prediction
  pub student_count: u64,
  pub model_trained: bool,
}

impl SystemReadiness {
  pub fn has_training_data(&self) -> bool {
    self.training_rows > 0
  }

  pub fn has_students(&self) -> bool {
    self.student_count > 0
  }

  pub fn is_enabled(&self, step: SetupStep) -> bool {
    match step {
      SetupStep::GenerateDataset => !self.has_training_data(),
      SetupStep::TrainModel => self.has_training_data(),
      SetupStep::RunPredictions => self.has_students() && self.model_trained,
    }
  }

  /// Whether a step's work is already reflected on the backend
  pub fn is_done(&self, step: SetupStep) -> bool {
    match step {
      SetupStep::GenerateDataset => self.has_training_data(),
      SetupStep::TrainModel => self.model_trained,
      // predictions can always be re-run; done is not observable from the probe
      SetupStep::RunPredictions => false,
    }
  }

  /// The step to suggest next, or `None` when students must be added first
  pub fn next_step(&self) -> Option<SetupStep> {
    if !self.has_training_data() {
      Some(SetupStep::GenerateDataset)
    } else if !self.model_trained {
      Some(SetupStep::TrainModel)
    } else if self.has_students() {
      Some(SetupStep::RunPredictions)
    } else {
      None
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
  GenerateDataset,
  TrainModel,
  RunPredictions,
}

impl SetupStep {
  pub const ALL: [SetupStep; 3] =
    [SetupStep::GenerateDataset, SetupStep::TrainModel, SetupStep::RunPredictions];

  pub fn number(&self) -> u8 {
    match self {
      SetupStep::GenerateDataset => 1,
      SetupStep::TrainModel => 2,
      SetupStep::RunPredictions => 3,
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      SetupStep::GenerateDataset => "Generate training dataset",
      SetupStep::TrainModel => "Train the risk model",
      SetupStep::RunPredictions => "Predict risk for all students",
    }
  }

  pub fn command(&self, n_samples: u32) -> Command {
    match self {
      SetupStep::GenerateDataset => Command::GenerateDataset { n_samples },
      SetupStep::TrainModel => Command::TrainModel,
      SetupStep::RunPredictions => Command::PredictBatch,
    }
  }
}

impl fmt::Display for SetupStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Step {}: {}", self.number(), self.title())
  }
}

/// Drives the three setup steps against a store
pub struct SetupWorkflow<'a> {
  store: &'a RemoteCollectionStore,
  readiness: SystemReadiness,
  n_samples: u32,
}

impl<'a> SetupWorkflow<'a> {
  /// Probe the backend and start from what it reports
  pub async fn mount(store: &'a RemoteCollectionStore) -> Result<Self> {
    let readiness = store.readiness().await?;
    Ok(Self { store, readiness, n_samples: DEFAULT_SAMPLE_COUNT })
  }

  pub fn with_sample_count(mut self, n_samples: u32) -> Self {
    self.n_samples = n_samples;
    self
  }

  pub fn readiness(&self) -> SystemReadiness {
    self.readiness
  }

  /// Available per the last probe; consumers also grey steps out while the store is busy
  pub fn is_enabled(&self, step: SetupStep) -> bool {
    self.readiness.is_enabled(step)
  }

  /// Run an enabled step, then re-probe
  pub async fn run(&mut self, step: SetupStep) -> Result<CommandOutcome> {
    if !self.is_enabled(step) {
      return Err(StoreError::validation(
        "setup_step",
        format!("{step} is not available yet"),
      ));
    }

    info!(step = step.number(), "running setup step");
    self.submit(step.command(self.n_samples)).await
  }

  /// Run any command (e.g. a manual student entry), then re-probe
  ///
  /// Readiness is re-read whenever the server applied the command, even if
  /// the store's own refresh afterwards failed.
  pub async fn submit(&mut self, command: Command) -> Result<CommandOutcome> {
    match self.store.run_command(command).await {
      Ok(outcome) => {
        self.refresh().await?;
        Ok(outcome)
      }
      Err(err) if err.applied_outcome().is_some() => {
        if let Err(check_err) = self.refresh().await {
          warn!(error = %check_err, "readiness check failed after partial refresh");
        }
        Err(err)
      }
      Err(err) => Err(err),
    }
  }

  pub async fn refresh(&mut self) -> Result<SystemReadiness> {
    self.readiness = self.store.readiness().await?;
    Ok(self.readiness)
  }
}
