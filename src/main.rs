//! livesync CLI entrypoint

use anyhow::Result;
use clap::Parser;

use livesync::cli::Cli;
use livesync::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first so the log file location is known
    let config = cli.load_config()?;
    init_tracing(config.as_ref().and_then(|c| c.log_file.as_deref()))?;

    cli.execute(config).await
}
