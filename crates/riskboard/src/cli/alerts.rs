use anyhow::{anyhow, Result};

use super::display;
use crate::api::AlertRequest;
use crate::command::{Collection, Command, CommandOutcome};
use crate::store::RemoteCollectionStore;
use crate::views::AlertSummary;

pub async fn handle(store: &RemoteCollectionStore) -> Result<()> {
  store.fetch(Collection::Alerts).await?;
  let alerts = store.alerts();
  let summary = AlertSummary::from_alerts(&alerts);

  display::announce("Alert Log");
  println!("Total alerts: {}   High risk: {}", summary.total, summary.high_risk);

  if alerts.is_empty() {
    display::info("No alerts have been sent yet");
    return Ok(());
  }

  for alert in alerts.iter() {
    println!();
    println!(
      "{}  {}  {}  {}",
      display::format_timestamp(alert.sent_at),
      display::risk_badge(alert.risk_level),
      alert.student_id,
      alert.phone_number
    );
    println!("  {}", alert.message);
    if let Some(status) = &alert.status {
      println!("  status: {status}");
    }
  }
  Ok(())
}

/// Send the standard alert for a student, overriding phone or message if given
pub async fn send(
  store: &RemoteCollectionStore,
  student_id: &str,
  phone: Option<String>,
  message: Option<String>,
) -> Result<()> {
  let detail = store.student_detail(student_id).await?;
  let student = detail.student;

  let phone = phone
    .or_else(|| student.phone_number.clone())
    .ok_or_else(|| anyhow!("Student {student_id} has no phone number on file; pass --phone"))?;

  let mut request = AlertRequest::for_student(&student, phone);
  if let Some(message) = message {
    request.message = message;
  }

  if let CommandOutcome::AlertSent(receipt) = store.run_command(Command::SendAlert(request)).await? {
    let status = receipt.sms.and_then(|sms| sms.status).or(receipt.status);
    display::success(&format!(
      "Alert sent for {student_id} ({})",
      status.as_deref().unwrap_or("queued")
    ));
  }
  Ok(())
}
