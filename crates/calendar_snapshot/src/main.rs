use clap::Parser;
use tracing_subscriber::EnvFilter;

use calendar_snapshot::config::CliArgs;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CliArgs::parse();
    match calendar_snapshot::run(cli).await {
        Ok(summary) => {
            println!(
                "Snapshot complete: {} world days, challenge months {:?}, {} detail pages",
                summary.world_days, summary.challenge_months, summary.detail_pages
            );
        }
        Err(err) => {
            eprintln!("calendar snapshot failed: {}", err);
            std::process::exit(1);
        }
    }
}
