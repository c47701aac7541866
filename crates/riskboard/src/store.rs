//! The remote collection store
//!
//! One store is built at startup and shared by reference with every
//! consumer. It owns the only copy of each collection snapshot; consumers get
//! `Arc` handles to immutable snapshots and derive their own views from them.
//!
//! Every fetch takes a per-collection sequence number. A response is applied
//! only when it is newer than the last one applied for that collection, so a
//! slow, older response can never overwrite fresher data.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::api::{
  Alert, DashboardApi, ModelMetrics, NewStudent, Prediction, Stats, Student, StudentDetail,
};
use crate::busy::{BusyTracker, Operation};
use crate::command::{validate_record, Collection, Command, CommandKind, CommandOutcome};
use crate::error::{Result, StoreError};
use crate::readiness::SystemReadiness;
use crate::views::StudentQuery;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
  /// Empty the student list when fetching it fails; other collections keep
  /// their last good snapshot regardless
  pub reset_students_on_error: bool,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self { reset_students_on_error: true }
  }
}

/// Change notifications sent to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
  Refreshed(Collection),
  Cleared(Collection),
  CommandCompleted(CommandKind),
}

/// A fetched collection
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
  Students(Arc<Vec<Student>>),
  Stats(Arc<Stats>),
  ModelMetrics(Arc<ModelMetrics>),
  Alerts(Arc<Vec<Alert>>),
}

#[derive(Default)]
struct StoreState {
  students: Arc<Vec<Student>>,
  stats: Option<Arc<Stats>>,
  model_metrics: Option<Arc<ModelMetrics>>,
  alerts: Arc<Vec<Alert>>,
  issued: [u64; Collection::ALL.len()],
  applied: [u64; Collection::ALL.len()],
}

pub struct RemoteCollectionStore {
  api: Arc<dyn DashboardApi>,
  options: StoreOptions,
  state: RwLock<StoreState>,
  busy: BusyTracker,
  events: broadcast::Sender<StoreEvent>,
}

// Store Constructor
// =================
impl RemoteCollectionStore {
  pub fn new(api: Arc<dyn DashboardApi>) -> Self {
    Self::with_options(api, StoreOptions::default())
  }

  pub fn with_options(api: Arc<dyn DashboardApi>, options: StoreOptions) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      api,
      options,
      state: RwLock::new(StoreState::default()),
      busy: BusyTracker::new(),
      events,
    }
  }
}

// Snapshots
// =========
impl RemoteCollectionStore {
  pub fn students(&self) -> Arc<Vec<Student>> {
    self.read_state().students.clone()
  }

  pub fn stats(&self) -> Option<Arc<Stats>> {
    self.read_state().stats.clone()
  }

  pub fn model_metrics(&self) -> Option<Arc<ModelMetrics>> {
    self.read_state().model_metrics.clone()
  }

  pub fn alerts(&self) -> Arc<Vec<Alert>> {
    self.read_state().alerts.clone()
  }

  /// Current snapshot of a collection; `None` for stats or metrics never fetched
  pub fn snapshot(&self, collection: Collection) -> Option<Snapshot> {
    let state = self.read_state();
    match collection {
      Collection::Students => Some(Snapshot::Students(state.students.clone())),
      Collection::Stats => state.stats.clone().map(Snapshot::Stats),
      Collection::ModelMetrics => state.model_metrics.clone().map(Snapshot::ModelMetrics),
      Collection::Alerts => Some(Snapshot::Alerts(state.alerts.clone())),
    }
  }

  /// Search/filter view over the current students snapshot
  pub fn filtered_students(&self, query: &StudentQuery) -> Vec<Student> {
    query.apply(&self.students())
  }

  pub fn is_busy(&self) -> bool {
    self.busy.is_busy()
  }

  pub fn in_flight(&self) -> Vec<Operation> {
    self.busy.in_flight()
  }

  pub fn busy_updates(&self) -> watch::Receiver<bool> {
    self.busy.subscribe()
  }

  pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
    self.events.subscribe()
  }
}

// Remote Operations
// =================
impl RemoteCollectionStore {
  /// Fetch a collection and replace its snapshot
  ///
  /// On failure the previous snapshot stays in place (the student list is
  /// emptied instead when `reset_students_on_error` is set) and the error is
  /// returned to the caller.
  pub async fn fetch(&self, collection: Collection) -> Result<Snapshot> {
    let _busy = self.busy.begin(Operation::Fetch(collection));
    let seq = self.issue(collection);
    debug!(%collection, seq, "fetching collection");

    let result = match collection {
      Collection::Students => {
        self.api.list_students().await.map(|students| Snapshot::Students(Arc::new(students)))
      }
      Collection::Stats => self.api.get_stats().await.map(|stats| Snapshot::Stats(Arc::new(stats))),
      Collection::ModelMetrics => {
        self.api.get_model_metrics().await.map(|metrics| Snapshot::ModelMetrics(Arc::new(metrics)))
      }
      Collection::Alerts => {
        self.api.list_alerts().await.map(|alerts| Snapshot::Alerts(Arc::new(alerts)))
      }
    };

    match result {
      Ok(snapshot) => {
        self.apply(collection, seq, snapshot.clone());
        Ok(snapshot)
      }
      Err(err) => {
        warn!(%collection, seq, error = %err, "fetch failed");
        self.record_failure(collection, seq);
        Err(err)
      }
    }
  }

  /// Run a mutating command, then its refresh cascade
  ///
  /// Validation failures return before any request is made. A rejected
  /// command skips the cascade entirely; a failed refresh stops the cascade
  /// and its error is returned.
  pub async fn run_command(&self, command: Command) -> Result<CommandOutcome> {
    let kind = command.kind();
    if let Err(err) = command.validate() {
      warn!(command = %kind, error = %err, "command rejected before sending");
      return Err(err);
    }

    let _busy = self.busy.begin(Operation::Command(kind));
    info!(command = %kind, "running command");

    let outcome = match self.execute(command).await {
      Ok(outcome) => outcome,
      Err(err) => {
        warn!(command = %kind, error = %err, "command failed, skipping refresh");
        return Err(err);
      }
    };

    for collection in kind.cascade() {
      if let Err(err) = self.fetch(*collection).await {
        warn!(
          command = %kind,
          collection = %collection,
          error = %err,
          "command applied but refresh failed"
        );
        self.emit(StoreEvent::CommandCompleted(kind));
        return Err(StoreError::refresh_failed(kind, *collection, outcome, err));
      }
    }

    info!(command = %kind, "command completed");
    self.emit(StoreEvent::CommandCompleted(kind));
    Ok(outcome)
  }

  /// One student with their interventions; never cached
  pub async fn student_detail(&self, student_id: &str) -> Result<StudentDetail> {
    if student_id.trim().is_empty() {
      return Err(StoreError::validation("student_id", "Student ID is required"));
    }

    let _busy = self.busy.begin(Operation::StudentDetail);
    self.api.get_student(student_id).await
  }

  /// Score a record without saving it
  pub async fn predict_student(&self, student: &NewStudent) -> Result<Prediction> {
    validate_record(student)?;

    let _busy = self.busy.begin(Operation::PredictStudent);
    self.api.predict_student(student).await
  }

  /// Probe the backend for setup progress in one coordinated call
  ///
  /// A 404 from the metrics endpoint means no model yet; any other failure
  /// fails the whole probe.
  pub async fn readiness(&self) -> Result<SystemReadiness> {
    let _busy = self.busy.begin(Operation::Readiness);

    let (training_rows, students, model_trained) =
      tokio::try_join!(self.api.training_count(), self.api.list_students(), self.model_trained())?;

    let readiness =
      SystemReadiness { training_rows, student_count: students.len() as u64, model_trained };
    debug!(?readiness, "probed readiness");
    Ok(readiness)
  }
}

// Internals
// =========
impl RemoteCollectionStore {
  async fn execute(&self, command: Command) -> Result<CommandOutcome> {
    let outcome = match command {
      Command::GenerateDataset { n_samples } => {
        CommandOutcome::DatasetGenerated(self.api.generate_dataset(n_samples).await?)
      }
      Command::TrainModel => CommandOutcome::ModelTrained(self.api.train_model().await?),
      Command::PredictBatch => CommandOutcome::BatchPredicted(self.api.predict_batch().await?),
      Command::AddStudent(student) => {
        CommandOutcome::StudentAdded(self.api.add_student(&student).await?)
      }
      Command::SendAlert(alert) => CommandOutcome::AlertSent(self.api.send_alert(&alert).await?),
      Command::CreateIntervention(intervention) => {
        CommandOutcome::InterventionRecorded(self.api.create_intervention(&intervention).await?)
      }
    };
    Ok(outcome)
  }

  async fn model_trained(&self) -> Result<bool> {
    match self.api.get_model_metrics().await {
      Ok(_) => Ok(true),
      Err(err) if err.is_not_found() => Ok(false),
      Err(err) => Err(err),
    }
  }

  fn issue(&self, collection: Collection) -> u64 {
    let mut state = self.write_state();
    state.issued[collection.index()] += 1;
    state.issued[collection.index()]
  }

  fn apply(&self, collection: Collection, seq: u64, snapshot: Snapshot) {
    let applied = {
      let mut state = self.write_state();
      if seq <= state.applied[collection.index()] {
        false
      } else {
        state.applied[collection.index()] = seq;
        match snapshot {
          Snapshot::Students(students) => state.students = students,
          Snapshot::Stats(stats) => state.stats = Some(stats),
          Snapshot::ModelMetrics(metrics) => state.model_metrics = Some(metrics),
          Snapshot::Alerts(alerts) => state.alerts = alerts,
        }
        true
      }
    };

    if applied {
      debug!(%collection, seq, "snapshot replaced");
      self.emit(StoreEvent::Refreshed(collection));
    } else {
      warn!(%collection, seq, "discarding stale response");
    }
  }

  fn record_failure(&self, collection: Collection, seq: u64) {
    if collection != Collection::Students || !self.options.reset_students_on_error {
      return;
    }

    let cleared = {
      let mut state = self.write_state();
      if seq <= state.applied[collection.index()] {
        false
      } else {
        state.applied[collection.index()] = seq;
        state.students = Arc::new(Vec::new());
        true
      }
    };

    if cleared {
      self.emit(StoreEvent::Cleared(collection));
    }
  }

  fn emit(&self, event: StoreEvent) {
    // no subscribers is fine
    let _ = self.events.send(event);
  }

  fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
    self.state.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
    self.state.write().unwrap_or_else(PoisonError::into_inner)
  }
}
