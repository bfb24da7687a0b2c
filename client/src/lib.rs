//! Chain-facing library for the vote sweeper tools.
//!
//! Wraps everything the operator binaries need from the node side: a JSON-RPC
//! client with transaction status tracking, the call/weight wire types, the
//! signing identity, and the encrypted keystore.

pub mod keystore;
pub mod rpc;
pub mod signer;
pub mod types;

pub use keystore::{Keystore, KeystoreError};
pub use rpc::{ClientError, NodeClient, TxLifecycleEvent};
pub use signer::{SignedTransaction, SigningIdentity};
pub use types::{Call, DispatchError, ModuleEvent, Weight};
