//! Node JSON-RPC client.
//!
//! Handles the HTTP round trips to the node and turns transaction status
//! polling into a stream of lifecycle events over a channel, so callers can
//! drive a plain receive loop instead of juggling callbacks.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::signer::SignedTransaction;
use crate::types::{DispatchError, ModuleEvent, Weight};

/// How often the watcher polls a submitted transaction's status.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Capacity of a per-submission lifecycle event channel.
const EVENT_CHANNEL_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Transaction status as reported by the node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TxStatusView {
    Pending,
    #[serde(rename_all = "camelCase")]
    InBlock {
        block_hash: String,
        #[serde(default)]
        dispatch_error: Option<DispatchError>,
        #[serde(default)]
        events: Vec<ModuleEvent>,
    },
    #[serde(rename_all = "camelCase")]
    Finalized {
        block_hash: String,
        #[serde(default)]
        dispatch_error: Option<DispatchError>,
    },
    Invalid {
        reason: String,
    },
}

/// Lifecycle events delivered for one submitted transaction.
///
/// Only state *transitions* are forwarded; the stream ends after the first
/// terminal event (finalization, a dispatch error, or invalidation).
#[derive(Debug, Clone, PartialEq)]
pub enum TxLifecycleEvent {
    Included {
        block_hash: String,
        dispatch_error: Option<DispatchError>,
    },
    Finalized {
        block_hash: String,
        dispatch_error: Option<DispatchError>,
    },
    Invalid {
        reason: String,
    },
}

/// JSON-RPC client for a single node endpoint.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl NodeClient {
    /// Connect to a node and verify the endpoint answers.
    pub async fn connect(rpc_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let client = Self {
            http,
            rpc_url: rpc_url.to_string(),
        };

        let chain: String = client.state("system_chain", json!([])).await?;
        info!("Connected to {} ({})", rpc_url, chain);
        Ok(client)
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if let Some(error) = json.get("error") {
            if !error.is_null() {
                return Err(ClientError::Rpc(error.to_string()));
            }
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| ClientError::Parse("no result in response".to_string()))
    }

    /// Typed state read. The governance plumbing goes through this.
    pub async fn state<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ClientError> {
        let result = self.request(method, params).await?;
        serde_json::from_value(result).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Per-block weight limit for the normal extrinsic class (chain constant).
    pub async fn block_weight_limit(&self) -> Result<Weight, ClientError> {
        self.state("chain_blockWeightLimit", json!([])).await
    }

    pub async fn account_nonce(&self, address: &str) -> Result<u64, ClientError> {
        self.state("system_accountNonce", json!([address])).await
    }

    /// Estimate the weight of a signed transaction without submitting it.
    ///
    /// Needs a signed candidate because weight and fee depend on the origin.
    pub async fn estimate_weight(&self, tx: &SignedTransaction) -> Result<Weight, ClientError> {
        self.state("payment_queryWeight", json!([tx])).await
    }

    /// Submit a signed transaction, returning its hash.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<String, ClientError> {
        self.state("author_submitExtrinsic", json!([tx])).await
    }

    pub async fn tx_status(&self, hash: &str) -> Result<TxStatusView, ClientError> {
        self.state("author_extrinsicStatus", json!([hash])).await
    }

    /// Submit a signed transaction and watch its lifecycle.
    ///
    /// The returned receiver yields inclusion, finalization and failure
    /// transitions; it closes after the terminal event. Dropping the receiver
    /// stops the watcher.
    pub async fn submit_and_watch(
        &self,
        tx: &SignedTransaction,
    ) -> Result<mpsc::Receiver<TxLifecycleEvent>, ClientError> {
        let hash = self.submit(tx).await?;
        debug!("Submitted extrinsic {}", hash);

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let client = self.clone();
        tokio::spawn(async move {
            client.watch_status(hash, events_tx).await;
        });
        Ok(events_rx)
    }

    async fn watch_status(&self, hash: String, events: mpsc::Sender<TxLifecycleEvent>) {
        let mut included_sent = false;
        loop {
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
            if events.is_closed() {
                return;
            }

            let view = match self.tx_status(&hash).await {
                Ok(view) => view,
                Err(e) => {
                    // Transient poll failures are retried on the next tick.
                    warn!("Status poll for {} failed: {}", hash, e);
                    continue;
                }
            };

            match view {
                TxStatusView::Pending => continue,
                TxStatusView::InBlock {
                    block_hash,
                    dispatch_error,
                    events: module_events,
                } => {
                    if included_sent {
                        continue;
                    }
                    included_sent = true;
                    for event in &module_events {
                        debug!("{}.{} {}", event.section, event.method, event.data);
                    }
                    let failed = dispatch_error.is_some();
                    if events
                        .send(TxLifecycleEvent::Included {
                            block_hash,
                            dispatch_error,
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                    // A dispatch failure is terminal even though the block
                    // will still finalize.
                    if failed {
                        return;
                    }
                }
                TxStatusView::Finalized {
                    block_hash,
                    dispatch_error,
                } => {
                    let _ = events
                        .send(TxLifecycleEvent::Finalized {
                            block_hash,
                            dispatch_error,
                        })
                        .await;
                    return;
                }
                TxStatusView::Invalid { reason } => {
                    let _ = events.send(TxLifecycleEvent::Invalid { reason }).await;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_view_parses_pending() {
        let view: TxStatusView = serde_json::from_value(json!({ "status": "pending" })).unwrap();
        assert!(matches!(view, TxStatusView::Pending));
    }

    #[test]
    fn test_status_view_parses_inclusion_with_events() {
        let view: TxStatusView = serde_json::from_value(json!({
            "status": "inBlock",
            "blockHash": "0xabc",
            "events": [
                { "section": "utility", "method": "BatchCompleted", "data": [] },
            ],
        }))
        .unwrap();
        match view {
            TxStatusView::InBlock {
                block_hash,
                dispatch_error,
                events,
            } => {
                assert_eq!(block_hash, "0xabc");
                assert!(dispatch_error.is_none());
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].section, "utility");
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_status_view_parses_finalization_with_dispatch_error() {
        let view: TxStatusView = serde_json::from_value(json!({
            "status": "finalized",
            "blockHash": "0xdef",
            "dispatchError": {
                "type": "module",
                "module": "democracy",
                "name": "NotVoter",
                "docs": "",
            },
        }))
        .unwrap();
        match view {
            TxStatusView::Finalized {
                block_hash,
                dispatch_error,
            } => {
                assert_eq!(block_hash, "0xdef");
                assert_eq!(
                    dispatch_error,
                    Some(DispatchError::Module {
                        module: "democracy".into(),
                        name: "NotVoter".into(),
                        docs: String::new(),
                    })
                );
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_status_view_parses_invalid() {
        let view: TxStatusView = serde_json::from_value(json!({
            "status": "invalid",
            "reason": "stale nonce",
        }))
        .unwrap();
        assert!(matches!(view, TxStatusView::Invalid { reason } if reason == "stale nonce"));
    }
}
