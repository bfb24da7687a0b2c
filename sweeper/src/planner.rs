//! Batch planner.
//!
//! Estimates the aggregate weight of submitting every removal call as one
//! transaction, derives how many batches the per-block weight limit allows,
//! and partitions the call list into contiguous chunks.

use std::str::FromStr;

use gov_client::{Call, NodeClient, SigningIdentity, Weight};
use tracing::info;

use crate::error::SweepError;

/// Headroom policy applied on top of the raw batch count, leaving room in
/// each block for regular network traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyMargin {
    /// Add a fixed number of extra batches.
    Additive(u64),
    /// Multiply the raw batch count.
    Multiplicative(u64),
}

impl SafetyMargin {
    pub fn apply(&self, raw: u64) -> u64 {
        match self {
            SafetyMargin::Additive(extra) => raw + extra,
            SafetyMargin::Multiplicative(factor) => raw * factor,
        }
    }
}

impl FromStr for SafetyMargin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s.split_at(1.min(s.len()));
        let parse = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| format!("invalid margin value in {:?}", s))
        };
        match kind {
            "+" => Ok(SafetyMargin::Additive(parse(value)?)),
            "x" => {
                let factor = parse(value)?;
                if factor == 0 {
                    return Err("multiplicative margin must be at least x1".to_string());
                }
                Ok(SafetyMargin::Multiplicative(factor))
            }
            _ => Err(format!(
                "margin must look like \"+3\" or \"x2\", got {:?}",
                s
            )),
        }
    }
}

impl std::fmt::Display for SafetyMargin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyMargin::Additive(extra) => write!(f, "+{}", extra),
            SafetyMargin::Multiplicative(factor) => write!(f, "x{}", factor),
        }
    }
}

/// Batches needed for one weight dimension.
///
/// Integer division plus one deliberately over-provisions: a cost exactly
/// divisible by the limit still gets an extra batch.
fn dimension_batches(cost: u64, limit: u64) -> u64 {
    cost / limit + 1
}

/// Batch count for an aggregate cost under a per-block limit, before and
/// after the safety margin.
pub fn batch_count(cost: Weight, limit: Weight, margin: SafetyMargin) -> u64 {
    let exec_batches = dimension_batches(cost.exec_time, limit.exec_time);
    let proof_batches = dimension_batches(cost.proof_size, limit.proof_size);
    margin.apply(exec_batches.max(proof_batches))
}

/// Split calls into contiguous chunks of `ceil(len / batch_count)`.
///
/// The last chunk may be shorter, and the number of chunks may come out
/// below `batch_count`; no chunk is ever empty.
pub fn partition(calls: Vec<Call>, batch_count: u64) -> Vec<Vec<Call>> {
    if calls.is_empty() {
        return Vec::new();
    }
    let batch_count = batch_count.max(1) as usize;
    let per_batch = (calls.len() + batch_count - 1) / batch_count;
    calls.chunks(per_batch).map(|chunk| chunk.to_vec()).collect()
}

/// Plan the batches for a full run.
///
/// Signs the all-in-one candidate aggregate, asks the node what it would
/// weigh, fetches the per-block limit once, and partitions accordingly. Each
/// chunk becomes a `utility.batch` aggregate, optionally wrapped in the
/// committee dispatch envelope.
pub async fn plan(
    client: &NodeClient,
    signer: &SigningIdentity,
    calls: Vec<Call>,
    margin: SafetyMargin,
    as_committee: bool,
) -> Result<Vec<Call>, SweepError> {
    if calls.is_empty() {
        return Ok(Vec::new());
    }

    let nonce = client.account_nonce(signer.address()).await?;
    let candidate = signer.sign_call(Call::batch(calls.clone()), nonce);
    let cost = client
        .estimate_weight(&candidate)
        .await
        .map_err(SweepError::Estimation)?;
    let limit = client.block_weight_limit().await?;

    info!(
        "Weight limit per block: execTime {} proofSize {}",
        limit.exec_time, limit.proof_size
    );
    info!(
        "Aggregate weight of {} calls: execTime {} proofSize {}",
        calls.len(),
        cost.exec_time,
        cost.proof_size
    );
    info!(
        "execTime requires {} batches, proofSize requires {} batches",
        dimension_batches(cost.exec_time, limit.exec_time),
        dimension_batches(cost.proof_size, limit.proof_size)
    );

    let count = batch_count(cost, limit, margin);
    let per_batch = (calls.len() + count as usize - 1) / count as usize;
    info!(
        "Splitting into {} batches of up to {} calls (margin {})",
        count, per_batch, margin
    );

    let batches: Vec<Call> = partition(calls, count)
        .into_iter()
        .map(|chunk| {
            let aggregate = Call::batch(chunk);
            if as_committee {
                Call::dispatch_as_committee(aggregate)
            } else {
                aggregate
            }
        })
        .collect();
    info!("Planned {} batches", batches.len());
    Ok(batches)
}
