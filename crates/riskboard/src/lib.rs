pub mod api;
pub mod busy;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod readiness;
pub mod store;
pub mod views;

// Re-export commonly used types for easier testing
pub use api::{DashboardApi, HttpDashboardApi, RiskLevel, Student};
pub use command::{Collection, Command, CommandKind, CommandOutcome};
pub use config::ClientConfig;
pub use error::{Result, StoreError};
pub use readiness::{SetupStep, SetupWorkflow, SystemReadiness};
pub use store::{RemoteCollectionStore, Snapshot, StoreEvent, StoreOptions};
pub use views::{RiskFilter, StudentQuery};
