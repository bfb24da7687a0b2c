//! Remove leftover democracy votes.
//!
//! The legacy democracy subsystem is halted, so every vote record it still
//! holds is stale. This pipeline signs with an encrypted keystore unlocked
//! interactively, and resolves each batch as soon as it lands in a block
//! rather than waiting for finality.

use clap::Parser;
use gov_client::{Keystore, NodeClient};
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

    info!("Started democracy-remove-votes");
    match run(&config).await {
        Ok(()) => {
            info!("Finished democracy-remove-votes");
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

    let keystore = Keystore::load(&config.keystore_path)?;
    // The prompt does not echo and restores the terminal mode on every exit
    // path, including a failed read. A wrong passphrase is not retried here;
    // the operator re-runs the tool.
    let passphrase = rpassword::prompt_password("Keystore passphrase: ")?;
    let signer = keystore.unlock(&passphrase)?;
    info!("Unlocked keystore; acting as {}", signer.address());

    let calls = votes::stale_democracy_votes(&client).await?;
    info!("Removal calls to submit: {}", calls.len());
    if calls.is_empty() {
        info!("No stale votes found, nothing to submit");
        return Ok(());
    }

    let margin = config.margin_or(SafetyMargin::Multiplicative(2));
    let batches = planner::plan(
        &client,
        &signer,
        calls,
        margin,
        config.dispatch_as_committee,
    )
    .await?;
    pipeline::submit_batches(&client, &signer, batches, FinalityPolicy::WaitForInclusion).await?;
    Ok(())
}
