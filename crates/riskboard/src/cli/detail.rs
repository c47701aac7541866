use anyhow::Result;

use super::display;
use crate::api::{InterventionRequest, InterventionType, StudentDetail};
use crate::command::{Command, CommandOutcome};
use crate::store::RemoteCollectionStore;

pub async fn handle(store: &RemoteCollectionStore, student_id: &str) -> Result<()> {
  let detail = store.student_detail(student_id).await?;
  render(&detail);
  Ok(())
}

/// Record an intervention, then show the student again with it included
pub async fn intervene(
  store: &RemoteCollectionStore,
  student_id: &str,
  kind: InterventionType,
  notes: Option<String>,
) -> Result<()> {
  let request =
    InterventionRequest { student_id: student_id.to_string(), intervention_type: kind, notes };

  if let CommandOutcome::InterventionRecorded(recorded) =
    store.run_command(Command::CreateIntervention(request)).await?
  {
    display::success(recorded.message.as_deref().unwrap_or("Intervention recorded"));
  }

  handle(store, student_id).await
}

fn render(detail: &StudentDetail) {
  let student = &detail.student;
  display::announce(&format!("Student {}", student.student_id));

  println!("Risk:          {}", display::risk_badge(student.effective_risk()));
  if let Some(confidence) = student.confidence {
    println!("Confidence:    {}", display::percent(confidence));
  }
  println!("Age:           {}", student.age);
  println!("Phone:         {}", student.phone_number.as_deref().unwrap_or("-"));

  display::section("Academic");
  println!("Attendance:    {:.1}%", student.attendance_percentage);
  println!("Average marks: {:.1}", student.average_marks);
  println!("Absences:      {} per month", student.absences_per_month);

  display::section("Background");
  println!("Distance:      {:.1} km", student.distance_to_school_km);
  println!("Family income: {}", student.family_income_level);
  println!("Parents:       {}", student.parents_education_level);
  println!("Health issues: {}", display::flag(student.health_issues));
  println!("Child labor:   {}", display::flag(student.child_labor));
  println!("Sibling left:  {}", display::flag(student.has_sibling_dropout));

  if !student.risk_factors.is_empty() {
    display::section("Risk factors");
    for factor in &student.risk_factors {
      println!("  - {factor}");
    }
  }

  display::section("Interventions");
  if detail.interventions.is_empty() {
    println!("  none recorded");
  }
  for intervention in &detail.interventions {
    println!(
      "  {}  {:<18} {}",
      display::format_timestamp(intervention.created_at),
      intervention.intervention_type.label(),
      intervention.notes.as_deref().unwrap_or("")
    );
  }
}
