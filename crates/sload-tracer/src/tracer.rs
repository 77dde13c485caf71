use core::fmt::Debug;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};

use crate::{ExecutionError, InterruptHandle, TracerError};

/// Read-only view of the execution engine's storage.
pub trait StateReader {
    /// The value of `slot` in the storage of `address`.
    ///
    /// Returns `None` only if the engine itself failed to produce a value; an untouched slot
    /// reads as zero.
    fn storage(&mut self, address: Address, slot: B256) -> Option<B256>;
}

/// Transaction context handed to [`Tracer::capture_start`].
#[derive(Debug, Clone, Copy)]
pub struct TxStart<'a> {
    /// Sender of the transaction.
    pub caller: Address,
    /// Receiver of the transaction, or the address of the contract it creates.
    pub target: Address,
    /// Whether the transaction creates a contract.
    pub create: bool,
    /// Call data or init code.
    pub input: &'a [u8],
    /// Gas limit of the outermost frame.
    pub gas_limit: u64,
    /// Value transferred to `target`.
    pub value: U256,
}

/// The interpreter state at one instruction, handed to [`Tracer::capture_state`].
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// Program counter of the instruction.
    pub pc: usize,
    /// The opcode about to execute.
    pub opcode: u8,
    /// Call depth, starting at 1 for the outermost frame.
    pub depth: usize,
    /// Address whose storage the executing frame operates on.
    pub address: Address,
    /// Operand stack, with the top of the stack last.
    pub stack: &'a [U256],
}

/// The kind of scope entered through [`Tracer::capture_enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A message call of any scheme.
    Call,
    /// A contract creation.
    Create,
    /// A self-destruct transferring the remaining balance.
    SelfDestruct,
}

/// A nested scope handed to [`Tracer::capture_enter`].
#[derive(Debug, Clone, Copy)]
pub struct FrameEnter<'a> {
    /// Kind of scope entered.
    pub kind: FrameKind,
    /// Address that opened the scope.
    pub from: Address,
    /// Target of the scope. Unknown for nested creations, which report the zero address.
    pub to: Address,
    /// Call data or init code.
    pub input: &'a [u8],
    /// Gas made available to the scope.
    pub gas_limit: u64,
    /// Value transferred to `to`.
    pub value: U256,
}

/// What [`Tracer::result`] returns when the result could be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerOutput {
    /// The rendered trace result.
    pub result: serde_json::Value,
    /// The reason passed to [`InterruptHandle::stop`], if the trace was asked to stop.
    pub interrupted: Option<String>,
}

/// The hook set a host execution engine drives while executing one transaction.
///
/// All `capture_*` hooks run on the execution thread, in execution order, and must stay cheap:
/// [`capture_state`](Self::capture_state) fires once per executed instruction. The host calls
/// [`result`](Self::result) after [`capture_end`](Self::capture_end); calling it earlier yields
/// whatever has been recorded so far.
pub trait Tracer: Debug + Send {
    /// The outermost frame starts.
    fn capture_start(&mut self, start: &TxStart<'_>);

    /// An instruction is about to execute. `state` reads the engine's current storage.
    fn capture_state(&mut self, step: &Step<'_>, state: &mut dyn StateReader);

    /// An instruction failed to execute.
    fn capture_fault(&mut self, _step: &Step<'_>, _err: &ExecutionError) {}

    /// Execution enters a nested call, creation or self-destruct scope.
    fn capture_enter(&mut self, _frame: &FrameEnter<'_>) {}

    /// Execution leaves the scope opened by the matching [`capture_enter`](Self::capture_enter).
    fn capture_exit(&mut self, _output: &[u8], _gas_used: u64, _err: Option<&ExecutionError>) {}

    /// The outermost frame finished.
    fn capture_end(
        &mut self,
        output: &[u8],
        gas_used: u64,
        elapsed: Duration,
        err: Option<&ExecutionError>,
    );

    /// A handle that asks this tracer to stop, usable from any thread.
    fn interrupt_handle(&self) -> InterruptHandle;

    /// Render the trace result.
    ///
    /// A rendering failure is returned as the error. An interruption requested through
    /// [`interrupt_handle`](Self::interrupt_handle) is reported in
    /// [`TracerOutput::interrupted`] next to the result.
    fn result(&self) -> Result<TracerOutput, TracerError>;
}

impl<T: Tracer + ?Sized> Tracer for Box<T> {
    fn capture_start(&mut self, start: &TxStart<'_>) {
        (**self).capture_start(start)
    }

    fn capture_state(&mut self, step: &Step<'_>, state: &mut dyn StateReader) {
        (**self).capture_state(step, state)
    }

    fn capture_fault(&mut self, step: &Step<'_>, err: &ExecutionError) {
        (**self).capture_fault(step, err)
    }

    fn capture_enter(&mut self, frame: &FrameEnter<'_>) {
        (**self).capture_enter(frame)
    }

    fn capture_exit(&mut self, output: &[u8], gas_used: u64, err: Option<&ExecutionError>) {
        (**self).capture_exit(output, gas_used, err)
    }

    fn capture_end(
        &mut self,
        output: &[u8],
        gas_used: u64,
        elapsed: Duration,
        err: Option<&ExecutionError>,
    ) {
        (**self).capture_end(output, gas_used, elapsed, err)
    }

    fn interrupt_handle(&self) -> InterruptHandle {
        (**self).interrupt_handle()
    }

    fn result(&self) -> Result<TracerOutput, TracerError> {
        (**self).result()
    }
}
