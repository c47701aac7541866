use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use riskboard::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  // RUST_LOG wins over the built-in defaults
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if cli.verbose {
      EnvFilter::new("riskboard=debug,info")
    } else {
      EnvFilter::new("riskboard=info,warn")
    }
  });

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  cli::run(cli).await
}
