//! Wire types shared between the RPC client and the operator tools.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single chain operation, JSON-encoded for submission.
///
/// Calls are opaque to the batching machinery: it only wraps them into
/// aggregates and never inspects the arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub module: String,
    pub method: String,
    pub args: Value,
}

impl Call {
    pub fn new(module: impl Into<String>, method: impl Into<String>, args: Value) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
            args,
        }
    }

    /// Wrap a list of calls into a single `utility.batch` aggregate.
    pub fn batch(calls: Vec<Call>) -> Self {
        Self::new("utility", "batch", json!({ "calls": calls }))
    }

    /// Wrap a call in the committee dispatch envelope, so it executes with the
    /// committee origin instead of the signer's own.
    pub fn dispatch_as_committee(call: Call) -> Self {
        Self::new("committee", "dispatchAs", json!({ "call": call }))
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

/// A two-dimensional block resource measure.
///
/// Used both as the per-block limit for the normal extrinsic class and as the
/// estimated cost of a candidate transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    pub exec_time: u64,
    pub proof_size: u64,
}

impl Weight {
    pub fn new(exec_time: u64, proof_size: u64) -> Self {
        Self {
            exec_time,
            proof_size,
        }
    }
}

/// An event emitted by a module while the transaction executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEvent {
    pub section: String,
    pub method: String,
    #[serde(default)]
    pub data: Value,
}

/// On-chain execution failure attached to an included transaction.
///
/// Known module errors arrive decoded (module + error name + docs); anything
/// else is reported as an opaque detail string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DispatchError {
    Module {
        module: String,
        name: String,
        #[serde(default)]
        docs: String,
    },
    Other {
        detail: String,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Module { module, name, docs } => {
                if docs.is_empty() {
                    write!(f, "{}.{}", module, name)
                } else {
                    write!(f, "{}.{}: {}", module, name, docs)
                }
            }
            DispatchError::Other { detail } => write!(f, "{}", detail),
        }
    }
}

impl std::error::Error for DispatchError {}
