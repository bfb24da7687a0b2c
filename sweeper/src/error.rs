//! Run-level error taxonomy.

use gov_client::{ClientError, DispatchError, KeystoreError};
use thiserror::Error;

/// Everything that can abort a sweep run.
///
/// None of these are recovered internally; they propagate to the binary,
/// which logs the diagnostic and exits non-zero. Re-running the tool is the
/// recovery path — the removal calls are idempotent, so batches that already
/// landed are simply no longer enumerated.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("chain query failed: {0}")]
    Query(#[from] ClientError),

    #[error("credential unlock failed: {0}")]
    Credential(#[from] KeystoreError),

    #[error("weight estimation failed: {0}")]
    Estimation(ClientError),

    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("transaction failed on-chain: {0}")]
    Dispatch(DispatchError),
}
