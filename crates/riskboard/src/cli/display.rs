//! Terminal rendering helpers
//!
//! Status lines go to stderr with a colored `[level]` prefix; tables and
//! records go to stdout so they can be piped.

use chrono::{DateTime, Local, Utc};
use colored::*;

use crate::api::RiskLevel;

const BANNER_WIDTH: usize = 50;

fn format_prefix(color: Color, prefix: &str) -> String {
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = 7 - prefix.len() - 2)
}

fn log_with(color: Color, prefix: &str, message: &str) {
  let prefix = format_prefix(color, prefix);
  for line in message.lines() {
    eprintln!("{prefix} {line}");
  }
}

pub fn info(message: &str) {
  log_with(Color::Blue, "info", message);
}

pub fn warn(message: &str) {
  log_with(Color::Yellow, "warn", message);
}

pub fn error(message: &str) {
  log_with(Color::Red, "error", message);
}

pub fn success(message: &str) {
  log_with(Color::Green, "sccs", message);
}

pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Page heading
pub fn announce(title: &str) {
  let line = banner_line(BANNER_WIDTH, '-');
  println!("{}", line.blue().bold());
  println!("{}", title.blue().bold());
  println!("{}", line.blue().bold());
}

pub fn section(title: &str) {
  println!();
  println!("{}", title.bold());
}

pub fn risk_badge(level: RiskLevel) -> ColoredString {
  let label = format!("{:<7}", level.as_str());
  match level {
    RiskLevel::High => label.red().bold(),
    RiskLevel::Medium => label.yellow().bold(),
    RiskLevel::Low => label.green().bold(),
    RiskLevel::Unknown => label.dimmed(),
  }
}

/// 0.8734 -> "87.3%"
pub fn percent(fraction: f64) -> String {
  format!("{:.1}%", fraction * 100.0)
}

pub fn bar(fraction: f64, width: usize) -> String {
  let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
  format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
  match timestamp {
    Some(utc) => {
      let local: DateTime<Local> = utc.into();
      local.format("%Y-%m-%d %H:%M").to_string()
    }
    None => "-".to_string(),
  }
}

pub fn flag(value: bool) -> &'static str {
  if value {
    "Yes"
  } else {
    "No"
  }
}
