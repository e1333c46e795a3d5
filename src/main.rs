use anyhow::Result;
use clap::Parser;

use voxprobe_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(cli).await
}
