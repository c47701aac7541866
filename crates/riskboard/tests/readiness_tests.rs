
use mock_api::MockDashboard;
use riskboard::api::NewStudent;
use riskboard::{
  Command, CommandOutcome, RemoteCollectionStore, SetupStep, SetupWorkflow, StoreError,
  SystemReadiness,
};
use std::sync::Arc;

#[tokio::test]
async fn test_full_setup_walkthrough() {
  let mock = Arc::new(MockDashboard::new());
  let store = RemoteCollectionStore::new(mock.clone());

  let mut workflow = SetupWorkflow::mount(&store).await.unwrap().with_sample_count(40);
  assert_eq!(workflow.readiness(), SystemReadiness::default());
  assert!(workflow.is_enabled(SetupStep::GenerateDataset));

  let outcome = workflow.run(SetupStep::GenerateDataset).await.unwrap();
  assert!(matches!(outcome, CommandOutcome::DatasetGenerated(ref d) if d.total_records == 40));
  assert_eq!(workflow.readiness().training_rows, 40);
  assert!(!workflow.is_enabled(SetupStep::GenerateDataset));
  assert!(workflow.is_enabled(SetupStep::TrainModel));

  workflow.run(SetupStep::TrainModel).await.unwrap();
  assert!(workflow.readiness().model_trained);
  // generating the dataset creates no students to predict for
  assert!(!workflow.is_enabled(SetupStep::RunPredictions));

  let student = NewStudent {
    phone_number: Some("+911234567890".to_string()),
    age: 16,
    attendance_percentage: 52.0,
    average_marks: 48.0,
    ..NewStudent::default()
  };
  workflow.submit(Command::AddStudent(student)).await.unwrap();
  assert_eq!(workflow.readiness().student_count, 1);
  assert!(workflow.is_enabled(SetupStep::RunPredictions));

  workflow.run(SetupStep::RunPredictions).await.unwrap();
  assert!(store.students()[0].has_prediction());

  // one probe on mount plus one after each of the four commands
  assert_eq!(mock.calls("training_count"), 5);
}

#[tokio::test]
async fn test_disabled_step_is_rejected_locally() {
  let mock = Arc::new(MockDashboard::new());
  let store = RemoteCollectionStore::new(mock.clone());
  let mut workflow = SetupWorkflow::mount(&store).await.unwrap();

  let err = workflow.run(SetupStep::TrainModel).await.unwrap_err();
  assert!(err.is_validation());
  assert_eq!(mock.calls("train_model"), 0);
}

#[tokio::test]
async fn test_probe_failure_fails_mount() {
  let mock = Arc::new(MockDashboard::new());
  mock.fail("training_count", StoreError::network("connection refused"));
  let store = RemoteCollectionStore::new(mock.clone());

  let result = SetupWorkflow::mount(&store).await;
  assert_eq!(result.err(), Some(StoreError::network("connection refused")));
}

#[tokio::test]
async fn test_metrics_server_error_is_not_untrained() {
  let mock = Arc::new(MockDashboard::new());
  mock.fail("get_model_metrics", StoreError::server(500, "metrics store down"));
  let store = RemoteCollectionStore::new(mock.clone());

  assert_eq!(store.readiness().await.unwrap_err(), StoreError::server(500, "metrics store down"));

  mock.recover("get_model_metrics");
  let readiness = store.readiness().await.unwrap();
  assert!(!readiness.model_trained);
}

#[tokio::test]
async fn test_failed_step_keeps_previous_readiness() {
  let mock = Arc::new(MockDashboard::new());
  *mock.training_rows.lock().unwrap() = 10;
  let store = RemoteCollectionStore::new(mock.clone());
  let mut workflow = SetupWorkflow::mount(&store).await.unwrap();

  mock.fail("train_model", StoreError::server(400, "insufficient data"));
  assert!(workflow.run(SetupStep::TrainModel).await.is_err());

  assert!(!workflow.readiness().model_trained);
  assert_eq!(mock.calls("training_count"), 1);
}

#[tokio::test]
async fn test_readiness_follows_applied_command_when_refresh_fails() {
  let mock = Arc::new(MockDashboard::new());
  let store = RemoteCollectionStore::new(mock.clone());
  let mut workflow = SetupWorkflow::mount(&store).await.unwrap().with_sample_count(40);

  mock.fail("get_stats", StoreError::network("connection reset"));
  let err = workflow.run(SetupStep::GenerateDataset).await.unwrap_err();

  assert!(matches!(
    err.applied_outcome(),
    Some(CommandOutcome::DatasetGenerated(d)) if d.total_records == 40
  ));
  assert_eq!(*mock.training_rows.lock().unwrap(), 40);
  assert_eq!(workflow.readiness().training_rows, 40);
  assert!(workflow.is_enabled(SetupStep::TrainModel));

  mock.recover("get_stats");
  workflow.run(SetupStep::TrainModel).await.unwrap();
  assert!(workflow.readiness().model_trained);
}

#[tokio::test]
async fn test_unreachable_students_leave_readiness_for_manual_refresh() {
  let mock = Arc::new(MockDashboard::new());
  let store = RemoteCollectionStore::new(mock.clone());
  let mut workflow = SetupWorkflow::mount(&store).await.unwrap().with_sample_count(40);

  // readiness also lists students, so it fails alongside the refresh
  mock.fail("list_students", StoreError::network("connection reset"));
  let err = workflow.run(SetupStep::GenerateDataset).await.unwrap_err();
  assert!(err.applied_outcome().is_some());
  assert_eq!(workflow.readiness().training_rows, 0);

  mock.recover("list_students");
  workflow.refresh().await.unwrap();
  assert_eq!(workflow.readiness().training_rows, 40);
  workflow.run(SetupStep::TrainModel).await.unwrap();
}
