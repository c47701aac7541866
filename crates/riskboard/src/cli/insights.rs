use anyhow::Result;

use super::display;
use crate::api::RiskLevel;
use crate::command::Collection;
use crate::store::RemoteCollectionStore;
use crate::views::{confusion_rows, feature_ranking};

const BAR_WIDTH: usize = 24;

pub async fn handle(store: &RemoteCollectionStore) -> Result<()> {
  if let Err(err) = store.fetch(Collection::ModelMetrics).await {
    if err.is_not_found() {
      display::warn("No model has been trained yet. Run `riskboard setup train`.");
      return Ok(());
    }
    return Err(err.into());
  }
  let Some(metrics) = store.model_metrics() else {
    return Ok(());
  };

  display::announce("Model Insights");
  println!("Accuracy: {}", display::percent(metrics.accuracy));

  display::section("Feature importance");
  for feature in feature_ranking(&metrics) {
    println!(
      "  {:>2}. {:<24} {} {:>5.1}%",
      feature.rank,
      feature.label,
      display::bar(feature.percent / 100.0, BAR_WIDTH),
      feature.percent
    );
  }

  if let Some(rows) = confusion_rows(&metrics) {
    display::section("Confusion matrix (rows: actual, columns: predicted)");
    let header: Vec<String> =
      RiskLevel::CONFUSION_ORDER.iter().map(|level| format!("{:>8}", level.as_str())).collect();
    println!("  {:<8}{}", "", header.join(""));
    for row in rows {
      let counts: Vec<String> = row.predicted.iter().map(|count| format!("{count:>8}")).collect();
      println!("  {:<8}{}", row.actual.as_str(), counts.join(""));
    }
  }
  Ok(())
}
