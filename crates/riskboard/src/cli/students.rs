use anyhow::Result;
use colored::*;

use super::display;
use crate::command::Collection;
use crate::store::RemoteCollectionStore;
use crate::views::{key_risk_factors, RiskFilter, StudentQuery};

pub async fn handle(store: &RemoteCollectionStore, search: String, risk: RiskFilter) -> Result<()> {
  store.fetch(Collection::Students).await?;

  let query = StudentQuery::new(search, risk);
  let students = store.filtered_students(&query);
  let total = store.students().len();

  display::announce("Students");

  if students.is_empty() {
    display::info("No students match the current search and filter");
    return Ok(());
  }

  println!(
    "{:<12} {:>4} {:>11} {:>7}  {:<7} {}",
    "ID".bold(),
    "Age".bold(),
    "Attendance".bold(),
    "Marks".bold(),
    "Risk".bold(),
    "Key factors".bold()
  );
  for student in &students {
    println!(
      "{:<12} {:>4} {:>10.1}% {:>7.1}  {} {}",
      student.student_id,
      student.age,
      student.attendance_percentage,
      student.average_marks,
      display::risk_badge(student.effective_risk()),
      key_risk_factors(student, 2).join(", ")
    );
  }

  display::info(&format!("Showing {} of {} students (risk: {})", students.len(), total, query.risk));
  Ok(())
}
