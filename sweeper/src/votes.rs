//! Stale-vote enumeration for the two governance subsystems.
//!
//! This is the data source for the batching machinery: it reads the voting
//! state, decides which records are stale, and emits one removal call per
//! stale vote. The calls are opaque downstream.

use std::collections::HashSet;

use gov_client::{Call, ClientError, NodeClient};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// One referendum's lifecycle state in the conviction-voting subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReferendumInfo {
    Ongoing,
    Approved,
    Rejected,
    Cancelled,
    TimedOut,
    Killed,
}

impl ReferendumInfo {
    /// Anything that is no longer ongoing has finished deciding.
    pub fn is_finished(&self) -> bool {
        !matches!(self, ReferendumInfo::Ongoing)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferendumEntry {
    pub index: u32,
    pub info: ReferendumInfo,
}

/// A single recorded vote; only the referendum index matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVote {
    pub referendum: u32,
}

/// A voter's state for one conviction-voting class.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Voting {
    Casting {
        votes: Vec<CastVote>,
    },
    Delegating {
        #[serde(default)]
        votes: Vec<CastVote>,
    },
}

impl Voting {
    fn votes(&self) -> &[CastVote] {
        match self {
            Voting::Casting { votes } | Voting::Delegating { votes } => votes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvictionVotingEntry {
    pub voter: String,
    pub class: u16,
    pub voting: Voting,
}

/// A voter's state in the legacy democracy subsystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DemocracyVoting {
    Direct {
        votes: Vec<CastVote>,
    },
    Delegating {
        #[serde(default)]
        votes: Vec<CastVote>,
    },
}

impl DemocracyVoting {
    fn votes(&self) -> &[CastVote] {
        match self {
            DemocracyVoting::Direct { votes } | DemocracyVoting::Delegating { votes } => votes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemocracyVotingEntry {
    pub voter: String,
    pub voting: DemocracyVoting,
}

fn force_remove_conviction_vote(voter: &str, class: u16, referendum: u32) -> Call {
    Call::new(
        "convictionVoting",
        "forceRemoveVote",
        json!({ "target": voter, "class": class, "index": referendum }),
    )
}

fn force_remove_democracy_vote(voter: &str, referendum: u32) -> Call {
    Call::new(
        "democracy",
        "forceRemoveVote",
        json!({ "target": voter, "index": referendum }),
    )
}

/// Removal calls for every conviction vote on a finished referendum.
fn conviction_removals(
    entries: &[ConvictionVotingEntry],
    finished: &HashSet<u32>,
) -> Vec<Call> {
    let mut calls = Vec::new();
    for entry in entries {
        for vote in entry.voting.votes() {
            if finished.contains(&vote.referendum) {
                calls.push(force_remove_conviction_vote(
                    &entry.voter,
                    entry.class,
                    vote.referendum,
                ));
            }
        }
    }
    calls
}

/// Removal calls for every remaining democracy vote.
///
/// The subsystem is halted, so every record still on chain is stale.
fn democracy_removals(entries: &[DemocracyVotingEntry]) -> Vec<Call> {
    let mut calls = Vec::new();
    for entry in entries {
        for vote in entry.voting.votes() {
            calls.push(force_remove_democracy_vote(&entry.voter, vote.referendum));
        }
    }
    calls
}

/// Enumerate stale conviction votes: any vote on a finished referendum.
pub async fn stale_conviction_votes(client: &NodeClient) -> Result<Vec<Call>, ClientError> {
    let voting_entries: Vec<ConvictionVotingEntry> = client
        .state("convictionVoting_votingFor", json!([]))
        .await?;
    info!("votingFor entries found: {}", voting_entries.len());

    let referenda: Vec<ReferendumEntry> = client
        .state("referenda_referendumInfoFor", json!([]))
        .await?;
    let finished: HashSet<u32> = referenda
        .iter()
        .filter(|entry| entry.info.is_finished())
        .map(|entry| entry.index)
        .collect();
    info!(
        "{} of {} referenda are finished",
        finished.len(),
        referenda.len()
    );

    Ok(conviction_removals(&voting_entries, &finished))
}

/// Enumerate every remaining democracy vote.
pub async fn stale_democracy_votes(client: &NodeClient) -> Result<Vec<Call>, ClientError> {
    let entries: Vec<DemocracyVotingEntry> =
        client.state("democracy_votingOf", json!([])).await?;
    info!("votingOf entries found: {}", entries.len());

    Ok(democracy_removals(&entries))
}
