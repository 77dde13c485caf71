use revm::interpreter::InstructionResult;

/// The error text the execution engine reports for a `REVERT`.
pub const EXECUTION_REVERTED: &str = "execution reverted";

/// A frame failure reported by the execution engine.
///
/// The display texts follow the strings Ethereum clients put into trace results, so that a
/// result produced here reads the same as one produced by a node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The frame executed `REVERT`.
    #[error("execution reverted")]
    Reverted,
    /// The frame ran out of gas.
    #[error("out of gas")]
    OutOfGas,
    /// An undefined or designated-invalid opcode was executed.
    #[error("invalid opcode")]
    InvalidOpcode,
    /// A jump targeted something other than a `JUMPDEST`.
    #[error("invalid jump destination")]
    InvalidJump,
    /// An instruction needed more operands than the stack held.
    #[error("stack underflow")]
    StackUnderflow,
    /// The stack grew past its limit.
    #[error("stack limit reached")]
    StackOverflow,
    /// A state modification was attempted inside a static call.
    #[error("write protection")]
    WriteProtection,
    /// A contract already exists at the creation address.
    #[error("contract address collision")]
    CreateCollision,
    /// The deployed code is larger than the code size limit.
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,
    /// The call depth limit was reached.
    #[error("max call depth exceeded")]
    CallDepthExceeded,
    /// The caller cannot afford the value transfer.
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    /// Any other failure, described by the engine.
    #[error("{0}")]
    Other(String),
}

impl ExecutionError {
    /// Maps an interpreter result to an execution error. Returns `None` for successful results.
    pub fn from_instruction_result(result: InstructionResult) -> Option<Self> {
        if result.is_ok() {
            return None;
        }
        let err = match result {
            InstructionResult::Revert => Self::Reverted,
            InstructionResult::OutOfGas |
            InstructionResult::MemoryOOG |
            InstructionResult::MemoryLimitOOG |
            InstructionResult::PrecompileOOG => Self::OutOfGas,
            InstructionResult::OpcodeNotFound | InstructionResult::InvalidFEOpcode => {
                Self::InvalidOpcode
            }
            InstructionResult::InvalidJump => Self::InvalidJump,
            InstructionResult::StackUnderflow => Self::StackUnderflow,
            InstructionResult::StackOverflow => Self::StackOverflow,
            InstructionResult::CallNotAllowedInsideStatic |
            InstructionResult::StateChangeDuringStaticCall => Self::WriteProtection,
            InstructionResult::CreateCollision => Self::CreateCollision,
            InstructionResult::CreateContractSizeLimit => Self::MaxCodeSizeExceeded,
            InstructionResult::CallTooDeep => Self::CallDepthExceeded,
            InstructionResult::OutOfFunds => Self::InsufficientBalance,
            other => Self::Other(format!("{other:?}")),
        };
        Some(err)
    }

    /// Returns `true` if this is the revert condition, which may carry return data.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Reverted => true,
            Self::Other(text) => text == EXECUTION_REVERTED,
            _ => false,
        }
    }
}

/// Errors surfaced by a tracer or the tracer registry.
#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    /// The trace result could not be rendered to JSON.
    #[error("failed to serialize trace result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No tracer is registered under the requested name.
    #[error("tracer {0:?} not found")]
    UnknownTracer(String),
}
