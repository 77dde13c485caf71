use serde::{Deserialize, Serialize};

use crate::PrestateStore;

/// The result rendered by [`SloadTracer`](crate::SloadTracer).
///
/// ```json
/// {
///   "storage": { "0x…address": { "storage": { "0x…slot": "0x…value" } } },
///   "output": "0x…",
///   "error": ""
/// }
/// ```
///
/// `output` and `error` are always present. `error` is empty when the transaction succeeded,
/// and `output` is empty when it failed without revert data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SloadTraceResult {
    /// Accounts and slots read by the transaction, with their values before it ran.
    #[serde(rename = "storage")]
    pub prestate: PrestateStore,
    /// Hex-encoded return data.
    pub output: String,
    /// Failure reason of the transaction.
    pub error: String,
}

/// Borrowed form of [`SloadTraceResult`], so rendering does not clone the prestate.
#[derive(Debug, Serialize)]
pub(crate) struct SloadTraceResultRef<'a> {
    #[serde(rename = "storage")]
    pub(crate) prestate: &'a PrestateStore,
    pub(crate) output: &'a str,
    pub(crate) error: &'a str,
}
