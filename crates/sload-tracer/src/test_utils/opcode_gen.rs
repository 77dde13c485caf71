//! This module provides utility functions to generate EVM bytecode.

use alloy_primitives::{Address, Bytes, U256};
use revm::bytecode::opcode::{
    CALL, CREATE, GAS, MSTORE, POP, PUSH0, RETURN, REVERT, SELFDESTRUCT, SLOAD, SSTORE, STOP,
};

/// Pads the bytes to the right with 0s to make it a multiple of the length.
pub fn right_pad_bytes(bytes: impl AsRef<[u8]>, multiple_of: usize) -> Vec<u8> {
    let bytes = bytes.as_ref().to_vec();
    let padding = (multiple_of - (bytes.len() % multiple_of)) % multiple_of;
    [bytes, vec![0u8; padding]].concat()
}

/// A builder for assembling EVM bytecode.
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    code: Vec<u8>,
}

impl BytecodeBuilder {
    /// Build the bytecode.
    pub fn build(self) -> Bytes {
        self.code.into()
    }

    /// Append a single opcode or byte.
    pub fn append(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    /// Append a series of opcodes or bytes.
    pub fn append_many(mut self, items: impl IntoIterator<Item = u8>) -> Self {
        self.code.extend(items);
        self
    }

    /// Append a PUSH opcode and the bytes to push.
    pub fn push_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes: &[u8] = bytes.as_ref();
        assert!(bytes.len() <= 32);
        self.code.push(PUSH0 + bytes.len() as u8);
        self.code.extend_from_slice(bytes);
        self
    }

    /// Append a PUSH opcode and the number to push, using as few bytes as possible.
    pub fn push_number(self, number: u64) -> Self {
        let bytes = number.to_be_bytes();
        let skip = bytes.iter().take_while(|byte| **byte == 0).count();
        self.push_bytes(&bytes[skip..])
    }

    /// Append a PUSH opcode and the address to push.
    pub fn push_address(self, address: Address) -> Self {
        self.push_bytes(address)
    }

    /// Append a PUSH opcode and the u256 value to push.
    pub fn push_u256(self, value: U256) -> Self {
        self.push_bytes(value.to_be_bytes::<32>())
    }

    /// Load `slot` and discard the value.
    pub fn sload(self, slot: U256) -> Self {
        self.push_u256(slot).append_many([SLOAD, POP])
    }

    /// Store `value` at `slot`.
    pub fn sstore(self, slot: U256, value: U256) -> Self {
        self.push_u256(value).push_u256(slot).append(SSTORE)
    }

    /// Append a series of MSTORE opcodes to store the given bytes at the given offset.
    pub fn mstore(self, offset: usize, bytes: impl AsRef<[u8]>) -> Self {
        let padded_bytes = right_pad_bytes(bytes, 32);
        let mut this = self;
        for (i, chunk) in padded_bytes.chunks(32).enumerate() {
            this = this.push_bytes(chunk);
            this = this.push_number((offset + i * 32) as u64);
            this.code.push(MSTORE);
        }
        this
    }

    /// Call `target` with no value and no call data, forwarding all gas and dropping the
    /// success flag.
    pub fn call(self, target: Address) -> Self {
        self.append_many([PUSH0, PUSH0, PUSH0, PUSH0, PUSH0])
            .push_address(target)
            .append_many([GAS, CALL, POP])
    }

    /// Create a contract with empty init code and no value, dropping its address.
    pub fn create_empty(self) -> Self {
        self.append_many([PUSH0, PUSH0, PUSH0, CREATE, POP])
    }

    /// Self-destruct, sending the balance to `beneficiary`.
    pub fn selfdestruct(self, beneficiary: Address) -> Self {
        self.push_address(beneficiary).append(SELFDESTRUCT)
    }

    /// Append a STOP opcode.
    pub fn stop(self) -> Self {
        self.append(STOP)
    }

    /// Append a RETURN opcode with the given return data.
    pub fn return_with_data(self, data: impl AsRef<[u8]>) -> Self {
        let data_len = data.as_ref().len() as u64;
        self.mstore(0, data).push_number(data_len).push_number(0).append(RETURN)
    }

    /// Append a REVERT opcode with the given return data.
    pub fn revert_with_data(self, data: impl AsRef<[u8]>) -> Self {
        let data_len = data.as_ref().len() as u64;
        self.mstore(0, data).push_number(data_len).push_number(0).append(REVERT)
    }
}
