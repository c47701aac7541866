use crate::command::{Collection, CommandKind, CommandOutcome};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
  #[error("Request could not reach the server: {message}")]
  Network { message: String },

  #[error("Server rejected the request (HTTP {status}): {message}")]
  Server { status: u16, message: String },

  #[error("Invalid {field}: {message}")]
  Validation { field: String, message: String },

  /// The command was applied but a follow-up refresh failed
  #[error("{command} succeeded but refreshing {collection} failed: {source}")]
  RefreshFailed {
    command: CommandKind,
    collection: Collection,
    outcome: Box<CommandOutcome>,
    source: Box<StoreError>,
  },
}

impl StoreError {
  pub fn network(message: impl Into<String>) -> Self {
    Self::Network { message: message.into() }
  }

  pub fn server(status: u16, message: impl Into<String>) -> Self {
    Self::Server { status, message: message.into() }
  }

  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation { field: field.into(), message: message.into() }
  }

  pub fn refresh_failed(
    command: CommandKind,
    collection: Collection,
    outcome: CommandOutcome,
    source: StoreError,
  ) -> Self {
    Self::RefreshFailed {
      command,
      collection,
      outcome: Box::new(outcome),
      source: Box::new(source),
    }
  }

  /// What the server did before the error, if the command itself went through
  pub fn applied_outcome(&self) -> Option<&CommandOutcome> {
    match self {
      Self::RefreshFailed { outcome, .. } => Some(outcome),
      _ => None,
    }
  }

  /// HTTP status of a server rejection, if this is one
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Server { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. })
  }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::DatasetGenerated;

  #[test]
  fn test_server_error_carries_status_and_message() {
    let err = StoreError::server(400, "insufficient data");
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Server rejected the request (HTTP 400): insufficient data");
  }

  #[test]
  fn test_not_found_only_for_404() {
    assert!(StoreError::server(404, "Model has not been trained yet").is_not_found());
    assert!(!StoreError::server(500, "boom").is_not_found());
    assert!(!StoreError::network("connection refused").is_not_found());
  }

  #[test]
  fn test_validation_message() {
    let err = StoreError::validation("phone_number", "Phone number is required");
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Invalid phone_number: Phone number is required");
  }

  #[test]
  fn test_refresh_failure_keeps_outcome() {
    let outcome = CommandOutcome::DatasetGenerated(DatasetGenerated {
      total_records: 40,
      message: None,
    });
    let err = StoreError::refresh_failed(
      CommandKind::GenerateDataset,
      Collection::Stats,
      outcome.clone(),
      StoreError::network("connection reset"),
    );

    assert_eq!(err.applied_outcome(), Some(&outcome));
    assert_eq!(err.status(), None);
    assert!(err.to_string().ends_with("failed: Request could not reach the server: connection reset"));
    assert!(StoreError::network("connection reset").applied_outcome().is_none());
  }
}
