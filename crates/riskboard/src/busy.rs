//! In-flight operation tracking
//!
//! Busy is the set of operations currently running, not a single flag that
//! each operation toggles. Overlapping operations therefore never clear each
//! other's spinner: the boolean only drops once the last of them has finished.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use crate::command::{Collection, CommandKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
  Fetch(Collection),
  Command(CommandKind),
  StudentDetail,
  PredictStudent,
  Readiness,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operation::Fetch(collection) => write!(f, "fetch {collection}"),
      Operation::Command(kind) => write!(f, "{kind}"),
      Operation::StudentDetail => f.write_str("student detail"),
      Operation::PredictStudent => f.write_str("predict student"),
      Operation::Readiness => f.write_str("readiness probe"),
    }
  }
}

pub struct BusyTracker {
  next_id: AtomicU64,
  in_flight: Mutex<BTreeMap<u64, Operation>>,
  busy_tx: watch::Sender<bool>,
}

impl Default for BusyTracker {
  fn default() -> Self {
    Self::new()
  }
}

impl BusyTracker {
  pub fn new() -> Self {
    let (busy_tx, _) = watch::channel(false);
    Self { next_id: AtomicU64::new(1), in_flight: Mutex::new(BTreeMap::new()), busy_tx }
  }

  /// Register an operation; it stays in flight until the guard drops
  pub fn begin(&self, operation: Operation) -> BusyGuard<'_> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    in_flight.insert(id, operation);
    self.busy_tx.send_replace(true);
    BusyGuard { tracker: self, id }
  }

  fn end(&self, id: u64) {
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    in_flight.remove(&id);
    self.busy_tx.send_replace(!in_flight.is_empty());
  }

  pub fn is_busy(&self) -> bool {
    *self.busy_tx.borrow()
  }

  /// Operations currently running, oldest first
  pub fn in_flight(&self) -> Vec<Operation> {
    let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    in_flight.values().copied().collect()
  }

  pub fn subscribe(&self) -> watch::Receiver<bool> {
    self.busy_tx.subscribe()
  }
}

/// Releases its operation on drop, whichever way the operation ended
#[must_use = "the operation is only tracked while the guard is alive"]
pub struct BusyGuard<'a> {
  tracker: &'a BusyTracker,
  id: u64,
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    self.tracker.end(self.id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_idle_by_default() {
    let tracker = BusyTracker::new();
    assert!(!tracker.is_busy());
    assert!(tracker.in_flight().is_empty());
  }

  #[test]
  fn test_guard_releases_on_drop() {
    let tracker = BusyTracker::new();
    {
      let _guard = tracker.begin(Operation::Fetch(Collection::Students));
      assert!(tracker.is_busy());
      assert_eq!(tracker.in_flight(), vec![Operation::Fetch(Collection::Students)]);
    }
    assert!(!tracker.is_busy());
  }

  #[test]
  fn test_overlapping_operations_keep_busy() {
    let tracker = BusyTracker::new();
    let first = tracker.begin(Operation::Command(CommandKind::TrainModel));
    let second = tracker.begin(Operation::Command(CommandKind::PredictBatch));

    drop(first);
    assert!(tracker.is_busy());
    assert_eq!(tracker.in_flight(), vec![Operation::Command(CommandKind::PredictBatch)]);

    drop(second);
    assert!(!tracker.is_busy());
  }

  #[test]
  fn test_same_operation_twice_counts_twice() {
    let tracker = BusyTracker::new();
    let a = tracker.begin(Operation::Fetch(Collection::Stats));
    let b = tracker.begin(Operation::Fetch(Collection::Stats));
    assert_eq!(tracker.in_flight().len(), 2);
    drop(b);
    assert!(tracker.is_busy());
    drop(a);
    assert!(!tracker.is_busy());
  }

  #[test]
  fn test_subscribers_see_transitions() {
    let tracker = BusyTracker::new();
    let rx = tracker.subscribe();
    assert!(!*rx.borrow());

    let guard = tracker.begin(Operation::Readiness);
    assert!(*rx.borrow());
    drop(guard);
    assert!(!*rx.borrow());
  }
}
