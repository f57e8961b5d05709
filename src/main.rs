use std::process::ExitCode;

use eventharvest::bootstrap::run;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!("Harvest failed: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
