//! Test utilities for the sload tracer.

mod evm;
mod opcode_gen;
mod state;

pub use evm::*;
pub use opcode_gen::*;
pub use state::*;
