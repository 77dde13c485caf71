//! Tests for the hooks `TracerInspector` delivers to a tracer.

use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, U256};
use revm::{
    bytecode::opcode::{INVALID, PUSH0, SLOAD},
    database::{CacheDB, EmptyDB},
};
use sload_tracer::{test_utils::*, *};

const CALLER: Address = address!("0000000000000000000000000000000000100000");
const CONTRACT: Address = address!("0000000000000000000000000000000000100001");
const CALLEE: Address = address!("0000000000000000000000000000000000100002");

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start { caller: Address, target: Address, create: bool },
    Fault { pc: usize, opcode: u8, depth: usize, address: Address, err: String },
    Enter { kind: FrameKind, from: Address, to: Address, value: U256 },
    Exit { err: Option<String> },
    End { err: Option<String> },
}

/// Records every hook except `capture_state`.
#[derive(Debug, Default)]
struct HookRecorder {
    events: Vec<Event>,
    interrupt: InterruptHandle,
}

impl Tracer for HookRecorder {
    fn capture_start(&mut self, start: &TxStart<'_>) {
        self.events.push(Event::Start {
            caller: start.caller,
            target: start.target,
            create: start.create,
        });
    }

    fn capture_state(&mut self, _step: &Step<'_>, _state: &mut dyn StateReader) {}

    fn capture_fault(&mut self, step: &Step<'_>, err: &ExecutionError) {
        self.events.push(Event::Fault {
            pc: step.pc,
            opcode: step.opcode,
            depth: step.depth,
            address: step.address,
            err: err.to_string(),
        });
    }

    fn capture_enter(&mut self, frame: &FrameEnter<'_>) {
        self.events.push(Event::Enter {
            kind: frame.kind,
            from: frame.from,
            to: frame.to,
            value: frame.value,
        });
    }

    fn capture_exit(&mut self, _output: &[u8], _gas_used: u64, err: Option<&ExecutionError>) {
        self.events.push(Event::Exit { err: err.map(ToString::to_string) });
    }

    fn capture_end(
        &mut self,
        _output: &[u8],
        _gas_used: u64,
        _elapsed: Duration,
        err: Option<&ExecutionError>,
    ) {
        self.events.push(Event::End { err: err.map(ToString::to_string) });
    }

    fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn result(&self) -> Result<TracerOutput, TracerError> {
        Ok(TracerOutput { result: serde_json::Value::Null, interrupted: None })
    }
}

fn invalid_opcode() -> Option<String> {
    Some("invalid opcode".to_string())
}

fn call_contract(db: &mut CacheDB<EmptyDB>) -> Vec<Event> {
    let (result, tracer) = transact_with_tracer(
        db,
        HookRecorder::default(),
        CALLER,
        Some(CONTRACT),
        Bytes::default(),
        U256::ZERO,
    );
    result.expect("transaction should be valid");
    tracer.events
}

#[test]
fn test_fault_reports_the_failing_instruction() {
    let mut db = CacheDB::<EmptyDB>::default();
    set_account_code(&mut db, CONTRACT, Bytes::from(vec![PUSH0, INVALID, SLOAD]));

    let events = call_contract(&mut db);
    assert_eq!(
        events,
        vec![
            Event::Start { caller: CALLER, target: CONTRACT, create: false },
            Event::Fault {
                pc: 1,
                opcode: INVALID,
                depth: 1,
                address: CONTRACT,
                err: "invalid opcode".to_string(),
            },
            Event::End { err: invalid_opcode() },
        ]
    );
}

#[test]
fn test_nested_scopes_enter_and_exit_in_order() {
    let mut db = CacheDB::<EmptyDB>::default();
    let code = BytecodeBuilder::default()
        .create_empty()
        .call(CALLEE)
        .selfdestruct(CALLER)
        .build();
    set_account_code(&mut db, CONTRACT, code);
    db.cache.accounts.get_mut(&CONTRACT).expect("contract was inserted").info.balance =
        U256::from(5);
    set_account_code(&mut db, CALLEE, Bytes::from(vec![PUSH0, INVALID, SLOAD]));

    let events = call_contract(&mut db);
    assert_eq!(
        events,
        vec![
            Event::Start { caller: CALLER, target: CONTRACT, create: false },
            Event::Enter {
                kind: FrameKind::Create,
                from: CONTRACT,
                to: Address::ZERO,
                value: U256::ZERO,
            },
            Event::Exit { err: None },
            Event::Enter { kind: FrameKind::Call, from: CONTRACT, to: CALLEE, value: U256::ZERO },
            Event::Fault {
                pc: 1,
                opcode: INVALID,
                depth: 2,
                address: CALLEE,
                err: "invalid opcode".to_string(),
            },
            Event::Exit { err: invalid_opcode() },
            Event::Enter {
                kind: FrameKind::SelfDestruct,
                from: CONTRACT,
                to: CALLER,
                value: U256::from(5),
            },
            Event::Exit { err: None },
            Event::End { err: None },
        ]
    );

    let enters = events.iter().filter(|event| matches!(event, Event::Enter { .. })).count();
    let exits = events.iter().filter(|event| matches!(event, Event::Exit { .. })).count();
    assert_eq!(enters, exits);
}
