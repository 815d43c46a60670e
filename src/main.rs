//! Sentryd CLI entry point.

use anyhow::Result;
use sentryd::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
