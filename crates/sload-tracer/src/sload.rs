use std::time::Duration;

use alloy_primitives::{hex, Address, B256, U256};
use revm::bytecode::opcode::SLOAD;
use tracing::{debug, trace, warn};

use crate::{
    result::SloadTraceResultRef, ExecutionError, InterruptHandle, PrestateStore, StateReader, Step,
    Tracer, TracerError, TracerOutput, TxStart,
};

/// Counters kept while tracing, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SloadStats {
    /// `SLOAD` instructions observed.
    pub sloads: u64,
    /// `SLOAD`s on a slot that was already recorded.
    pub repeated: u64,
    /// `SLOAD`s observed with an empty operand stack.
    pub malformed: u64,
}

/// Records the storage prestate read by a transaction through `SLOAD`.
///
/// On start the caller and the target are recorded with empty storage. Every `SLOAD` then adds
/// the executing contract and the loaded slot, reading the slot's value from the engine the
/// first time it is seen. Each account and slot is recorded at most once per trace. If the
/// transaction creates a contract, that contract is dropped from the result when the trace
/// ends.
///
/// Only the outermost frame's caller and target are recorded unconditionally; accounts of
/// nested calls appear only if one of their slots is loaded.
///
/// A stop requested through [`Tracer::interrupt_handle`] is reported by
/// [`Tracer::result`], but recording is not cut short: the hooks keep recording until the
/// engine ends the transaction.
#[derive(Debug, Default)]
pub struct SloadTracer {
    prestate: PrestateStore,
    create: bool,
    to: Address,
    output: String,
    error: String,
    interrupt: InterruptHandle,
    stats: SloadStats,
}

impl SloadTracer {
    /// The name this tracer is registered under.
    pub const NAME: &'static str = "sloadTracer";

    /// Create a tracer for one transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// The prestate recorded so far.
    pub fn prestate(&self) -> &PrestateStore {
        &self.prestate
    }

    /// Hex-encoded output captured at the end of the trace.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Failure reason captured at the end of the trace.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Counters collected so far.
    pub fn stats(&self) -> SloadStats {
        self.stats
    }

    /// Record the slot on top of `stack` for `address`.
    fn record_sload(&mut self, address: Address, stack: &[U256], state: &mut dyn StateReader) {
        self.stats.sloads += 1;
        let Some(top) = stack.last() else {
            self.stats.malformed += 1;
            trace!(%address, "SLOAD with empty stack");
            return;
        };
        let slot = B256::from(top.to_be_bytes::<32>());

        self.prestate.ensure_account(address);
        if self.prestate.contains_slot(address, slot) {
            self.stats.repeated += 1;
            return;
        }
        match state.storage(address, slot) {
            Some(value) => {
                self.prestate.ensure_slot(address, slot, value);
            }
            None => warn!(%address, %slot, "Failed to read storage slot, skipping"),
        }
    }
}

impl Tracer for SloadTracer {
    fn capture_start(&mut self, start: &TxStart<'_>) {
        trace!(
            caller = %start.caller,
            target = %start.target,
            create = start.create,
            "Trace started"
        );
        self.create = start.create;
        self.to = start.target;

        self.prestate.ensure_account(start.caller);
        self.prestate.ensure_account(start.target);
    }

    fn capture_state(&mut self, step: &Step<'_>, state: &mut dyn StateReader) {
        if step.opcode == SLOAD {
            self.record_sload(step.address, step.stack, state);
        }
    }

    fn capture_end(
        &mut self,
        output: &[u8],
        gas_used: u64,
        elapsed: Duration,
        err: Option<&ExecutionError>,
    ) {
        if self.create {
            trace!(contract = %self.to, "Excluding created contract from prestate");
            self.prestate.remove_account(self.to);
        }

        match err {
            Some(err) => {
                self.error = err.to_string();
                if err.is_revert() && !output.is_empty() {
                    self.output = hex::encode_prefixed(output);
                }
            }
            None => self.output = hex::encode_prefixed(output),
        }

        debug!(
            accounts = self.prestate.len(),
            slots = self.prestate.slot_count(),
            sloads = self.stats.sloads,
            repeated = self.stats.repeated,
            gas_used,
            ?elapsed,
            error = %self.error,
            "Trace ended"
        );
    }

    fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn result(&self) -> Result<TracerOutput, TracerError> {
        let result = serde_json::to_value(SloadTraceResultRef {
            prestate: &self.prestate,
            output: &self.output,
            error: &self.error,
        })?;
        Ok(TracerOutput { result, interrupted: self.interrupt.reason().map(str::to_owned) })
    }
}
