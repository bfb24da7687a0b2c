//! Configuration for the sweeper binaries.
//!
//! Every option can be supplied as an environment variable so the binaries
//! run with no arguments; an explicit flag wins over the environment, which
//! wins over the built-in default.

use clap::Parser;
use std::path::PathBuf;

use crate::planner::SafetyMargin;

#[derive(Parser, Debug, Clone)]
#[command(name = "gov-sweeper")]
#[command(about = "Remove stale governance votes in weight-bounded batches", long_about = None)]
pub struct Config {
    /// Node JSON-RPC endpoint
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8000")]
    pub rpc_url: String,

    /// Seed phrase for the deterministic signing identity
    #[arg(long, env = "ACCOUNT_SECRET", default_value = "//Alice")]
    pub account_secret: String,

    /// Path to the encrypted operator keystore
    #[arg(long, env = "KEYSTORE_PATH", default_value = "operator-key.json")]
    pub keystore_path: PathBuf,

    /// Batch-count safety margin: "+N" adds N batches, "xN" multiplies by N.
    /// Each binary has its own default when unset.
    #[arg(long, env = "BATCH_MARGIN")]
    pub batch_margin: Option<SafetyMargin>,

    /// Wrap each batch in the committee dispatch envelope
    #[arg(long, env = "DISPATCH_AS_COMMITTEE")]
    pub dispatch_as_committee: bool,
}

impl Config {
    /// The margin to use, falling back to the binary's own default.
    pub fn margin_or(&self, default: SafetyMargin) -> SafetyMargin {
        self.batch_margin.unwrap_or(default)
    }
}
