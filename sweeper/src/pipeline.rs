//! Submission pipeline.
//!
//! Drives each planned batch through sign → broadcast → included →
//! finalized/failed, strictly one batch at a time. Waiting on the next batch
//! until the previous one reaches a terminal state keeps nonces ordered and
//! lets the operator watch progress batch by batch.

use gov_client::{Call, NodeClient, SigningIdentity, TxLifecycleEvent};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::SweepError;

/// What counts as terminal success for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalityPolicy {
    /// Wait for the consensus finality signal.
    WaitForFinality,
    /// Resolve as soon as the batch lands in a block.
    WaitForInclusion,
}

/// Terminal success state of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Included { block_hash: String },
    Finalized { block_hash: String },
}

/// Drive one submission's lifecycle events to a terminal state.
///
/// A dispatch error reported at inclusion fails the batch immediately — the
/// block still finalizes, but the semantic outcome is already failure. A
/// stream that ends without a terminal event counts as a broadcast failure.
pub async fn watch_until_terminal(
    rx: &mut mpsc::Receiver<TxLifecycleEvent>,
    policy: FinalityPolicy,
) -> Result<BatchOutcome, SweepError> {
    while let Some(event) = rx.recv().await {
        match event {
            TxLifecycleEvent::Included {
                block_hash,
                dispatch_error: Some(error),
            } => {
                info!("Included in block: {} (dispatch failed)", block_hash);
                return Err(SweepError::Dispatch(error));
            }
            TxLifecycleEvent::Included {
                block_hash,
                dispatch_error: None,
            } => {
                info!("Included in block: {}", block_hash);
                if policy == FinalityPolicy::WaitForInclusion {
                    return Ok(BatchOutcome::Included { block_hash });
                }
            }
            TxLifecycleEvent::Finalized {
                dispatch_error: Some(error),
                ..
            } => return Err(SweepError::Dispatch(error)),
            TxLifecycleEvent::Finalized {
                block_hash,
                dispatch_error: None,
            } => {
                info!("Finalized at block: {}", block_hash);
                return Ok(BatchOutcome::Finalized { block_hash });
            }
            TxLifecycleEvent::Invalid { reason } => {
                return Err(SweepError::Broadcast(reason));
            }
        }
    }
    Err(SweepError::Broadcast(
        "status stream ended before a terminal state".to_string(),
    ))
}

/// Submit every batch sequentially, aborting the run on the first failure.
///
/// Earlier batches that already reached a terminal state stand; nothing is
/// rolled back. A fresh nonce is fetched per batch since the previous batch
/// has already landed by the time the next one is signed.
pub async fn submit_batches(
    client: &NodeClient,
    signer: &SigningIdentity,
    batches: Vec<Call>,
    policy: FinalityPolicy,
) -> Result<(), SweepError> {
    let total = batches.len();
    for (index, batch) in batches.into_iter().enumerate() {
        info!("Processing batch {}/{}", index + 1, total);

        let nonce = client.account_nonce(signer.address()).await?;
        let signed = signer.sign_call(batch, nonce);
        let mut rx = client
            .submit_and_watch(&signed)
            .await
            .map_err(|e| SweepError::Broadcast(e.to_string()))?;

        match watch_until_terminal(&mut rx, policy).await? {
            BatchOutcome::Included { .. } => {
                info!("Batch {}/{} included", index + 1, total);
            }
            BatchOutcome::Finalized { .. } => {
                info!("Batch {}/{} finalized", index + 1, total);
            }
        }
    }
    Ok(())
}
