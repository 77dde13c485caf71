//! Adapter driving a [`Tracer`] from revm's inspector hooks.

use std::time::Instant;

use alloy_primitives::{Address, Bytes, B256, U256};
use revm::{
    context::ContextTr,
    interpreter::{
        interpreter::EthInterpreter,
        interpreter_types::{InputsTr, Jumps, LoopControl},
        CallInputs, CallOutcome, CreateInputs, CreateOutcome, Interpreter, InterpreterResult,
    },
    Database, Inspector,
};
use tracing::trace;

use crate::{ExecutionError, FrameEnter, FrameKind, StateReader, Step, Tracer, TxStart};

/// Reads storage straight from the context database.
///
/// The database holds the state as it was before the transaction, so the value returned is the
/// slot's prestate even if the transaction already wrote to it.
struct DatabaseReader<'a, DB>(&'a mut DB);

impl<DB: Database> StateReader for DatabaseReader<'_, DB> {
    fn storage(&mut self, address: Address, slot: B256) -> Option<B256> {
        let value = self.0.storage(address, U256::from_be_bytes(slot.0)).ok()?;
        Some(B256::from(value.to_be_bytes::<32>()))
    }
}

/// The outermost creation, waiting for its interpreter to reveal the new contract's address.
#[derive(Debug)]
struct PendingCreate {
    caller: Address,
    init_code: Bytes,
    gas_limit: u64,
    value: U256,
}

/// Runs a [`Tracer`] as a revm [`Inspector`].
///
/// Hooks of the outermost frame map to [`Tracer::capture_start`] and [`Tracer::capture_end`].
/// Nested frames map to [`Tracer::capture_enter`] and [`Tracer::capture_exit`]. Every step maps
/// to [`Tracer::capture_state`], and a step that halts its frame with an error additionally to
/// [`Tracer::capture_fault`].
///
/// One inspector traces one transaction. Take the tracer back with
/// [`into_tracer`](Self::into_tracer) after execution to read its result.
#[derive(Debug)]
pub struct TracerInspector<T> {
    tracer: T,
    /// Number of frames currently open.
    depth: usize,
    started: bool,
    pending_create: Option<PendingCreate>,
    started_at: Option<Instant>,
    /// Program counter and opcode of the instruction currently executing. By `step_end` the
    /// interpreter has already moved past it.
    last_step: Option<(usize, u8)>,
}

impl<T: Tracer> TracerInspector<T> {
    /// Wrap `tracer`.
    pub fn new(tracer: T) -> Self {
        Self {
            tracer,
            depth: 0,
            started: false,
            pending_create: None,
            started_at: None,
            last_step: None,
        }
    }

    /// The wrapped tracer.
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Consume the inspector and return the wrapped tracer.
    pub fn into_tracer(self) -> T {
        self.tracer
    }

    fn start(&mut self, start: TxStart<'_>) {
        self.started = true;
        self.started_at = Some(Instant::now());
        self.tracer.capture_start(&start);
    }

    /// Start the trace for the pending outermost creation once the new address is known.
    fn start_pending_create(&mut self, target: Address) {
        let Some(pending) = self.pending_create.take() else { return };
        self.start(TxStart {
            caller: pending.caller,
            target,
            create: true,
            input: &pending.init_code,
            gas_limit: pending.gas_limit,
            value: pending.value,
        });
    }

    fn end(&mut self, result: &InterpreterResult) {
        let elapsed = self.started_at.map(|at| at.elapsed()).unwrap_or_default();
        let err = ExecutionError::from_instruction_result(result.result);
        trace!(result = ?result.result, "Outermost frame finished");
        self.tracer.capture_end(&result.output, result.gas.spent(), elapsed, err.as_ref());
    }

    fn exit(&mut self, result: &InterpreterResult) {
        let err = ExecutionError::from_instruction_result(result.result);
        self.tracer.capture_exit(&result.output, result.gas.spent(), err.as_ref());
    }

    fn step_of<'a>(&self, interp: &'a Interpreter<EthInterpreter>) -> Step<'a> {
        Step {
            pc: interp.bytecode.pc(),
            opcode: interp.bytecode.opcode(),
            depth: self.depth,
            address: interp.input.target_address(),
            stack: interp.stack.data(),
        }
    }
}

impl<CTX: ContextTr, T: Tracer> Inspector<CTX> for TracerInspector<T> {
    fn initialize_interp(&mut self, interp: &mut Interpreter<EthInterpreter>, _context: &mut CTX) {
        if self.depth == 1 && !self.started {
            self.start_pending_create(interp.input.target_address());
        }
    }

    fn step(&mut self, interp: &mut Interpreter<EthInterpreter>, context: &mut CTX) {
        let step = self.step_of(interp);
        self.last_step = Some((step.pc, step.opcode));
        let mut state = DatabaseReader(context.db());
        self.tracer.capture_state(&step, &mut state);
    }

    fn step_end(&mut self, interp: &mut Interpreter<EthInterpreter>, _context: &mut CTX) {
        let result = interp.control.instruction_result();
        if !result.is_error() {
            return;
        }
        let Some(err) = ExecutionError::from_instruction_result(result) else { return };
        let mut step = self.step_of(interp);
        if let Some((pc, opcode)) = self.last_step {
            step.pc = pc;
            step.opcode = opcode;
        }
        self.tracer.capture_fault(&step, &err);
    }

    fn call(&mut self, _context: &mut CTX, inputs: &mut CallInputs) -> Option<CallOutcome> {
        if self.depth == 0 {
            self.start(TxStart {
                caller: inputs.caller,
                target: inputs.target_address,
                create: false,
                input: &inputs.input,
                gas_limit: inputs.gas_limit,
                value: inputs.value.get(),
            });
        } else {
            self.tracer.capture_enter(&FrameEnter {
                kind: FrameKind::Call,
                from: inputs.caller,
                to: inputs.target_address,
                input: &inputs.input,
                gas_limit: inputs.gas_limit,
                value: inputs.value.get(),
            });
        }
        self.depth += 1;
        None
    }

    fn call_end(&mut self, _context: &mut CTX, _inputs: &CallInputs, outcome: &mut CallOutcome) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.end(&outcome.result);
        } else {
            self.exit(&outcome.result);
        }
    }

    fn create(&mut self, _context: &mut CTX, inputs: &mut CreateInputs) -> Option<CreateOutcome> {
        if self.depth == 0 {
            self.pending_create = Some(PendingCreate {
                caller: inputs.caller,
                init_code: inputs.init_code.clone(),
                gas_limit: inputs.gas_limit,
                value: inputs.value,
            });
        } else {
            self.tracer.capture_enter(&FrameEnter {
                kind: FrameKind::Create,
                from: inputs.caller,
                to: Address::ZERO,
                input: &inputs.init_code,
                gas_limit: inputs.gas_limit,
                value: inputs.value,
            });
        }
        self.depth += 1;
        None
    }

    fn create_end(
        &mut self,
        _context: &mut CTX,
        _inputs: &CreateInputs,
        outcome: &mut CreateOutcome,
    ) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            self.exit(&outcome.result);
            return;
        }
        // The creation failed before an interpreter ran, so start with whatever address the
        // engine reports.
        if !self.started {
            self.start_pending_create(outcome.address.unwrap_or_default());
        }
        self.end(&outcome.result);
    }

    fn selfdestruct(&mut self, contract: Address, target: Address, value: U256) {
        self.tracer.capture_enter(&FrameEnter {
            kind: FrameKind::SelfDestruct,
            from: contract,
            to: target,
            input: &[],
            gas_limit: 0,
            value,
        });
        self.tracer.capture_exit(&[], 0, None);
    }
}
