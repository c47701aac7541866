use anyhow::Result;

use super::display;
use crate::command::Collection;
use crate::store::RemoteCollectionStore;
use crate::views::DashboardSummary;

const BAR_WIDTH: usize = 30;

pub async fn handle(store: &RemoteCollectionStore) -> Result<()> {
  store.fetch(Collection::Stats).await?;
  let Some(stats) = store.stats() else {
    return Ok(());
  };
  let summary = DashboardSummary::from_stats(&stats);

  display::announce("Risk Dashboard");

  if summary.is_empty() {
    display::warn("No students yet. Run `riskboard setup` to generate data and train the model.");
    return Ok(());
  }

  println!("Total students:     {}", summary.total_students);
  println!("High risk:          {}", summary.high_risk);
  println!("Average attendance: {:.1}%", summary.average_attendance);
  println!("Average marks:      {:.1}", summary.average_marks);

  display::section("Risk distribution");
  for share in &summary.chart {
    println!(
      "  {} {} {:>4} ({})",
      display::risk_badge(share.level),
      display::bar(share.share, BAR_WIDTH),
      share.count,
      display::percent(share.share)
    );
  }

  if !summary.has_predictions {
    display::warn("Students have not been scored yet. Run `riskboard setup predict`.");
  }
  Ok(())
}
