//! Remove stale conviction-voting votes.
//!
//! Fixed pipeline, driven entirely by environment variables: connect to the
//! node, enumerate votes on finished referenda, split the removal calls into
//! weight-bounded batches and submit them one after another, waiting for
//! each batch to finalize before the next is signed.

use clap::Parser;
use gov_client::{NodeClient, SigningIdentity};
use gov_sweeper::config::Config;
use gov_sweeper::pipeline::{self, FinalityPolicy};
use gov_sweeper::planner::{self, SafetyMargin};
use gov_sweeper::votes;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::parse();

    info!("Started conviction-voting-remove-votes");
    match run(&config).await {
        Ok(()) => {
            info!("Finished conviction-voting-remove-votes");
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}

async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = NodeClient::connect(&config.rpc_url).await?;

    let signer = SigningIdentity::from_seed_phrase(&config.account_secret);
    info!("Acting as {}", signer.address());

    let calls = votes::stale_conviction_votes(&client).await?;
    info!("Removal calls to submit: {}", calls.len());
    if calls.is_empty() {
        info!("No stale votes found, nothing to submit");
        return Ok(());
    }

    let margin = config.margin_or(SafetyMargin::Additive(3));
    let batches = planner::plan(
        &client,
        &signer,
        calls,
        margin,
        config.dispatch_as_committee,
    )
    .await?;
    pipeline::submit_batches(&client, &signer, batches, FinalityPolicy::WaitForFinality).await?;
    Ok(())
}
