use std::convert::Infallible;

use alloy_evm::{eth::EthEvmFactory, Evm, EvmEnv, EvmFactory};
use alloy_primitives::{Address, Bytes, TxKind, U256};
use revm::{
    context::{
        result::{EVMError, ResultAndState},
        TxEnv,
    },
    database::{CacheDB, EmptyDB},
    state::{AccountInfo, Bytecode},
};

use crate::{Tracer, TracerInspector};

/// Sets the code for an account in the database.
pub fn set_account_code(db: &mut CacheDB<EmptyDB>, address: Address, code: Bytes) {
    let bytecode = Bytecode::new_legacy(code);
    let code_hash = bytecode.hash_slow();
    let account_info = AccountInfo { code: Some(bytecode), code_hash, ..Default::default() };
    db.insert_account_info(address, account_info);
}

/// Sets a storage slot for an account in the database.
pub fn set_account_storage(db: &mut CacheDB<EmptyDB>, address: Address, slot: U256, value: U256) {
    db.insert_account_storage(address, slot, value)
        .unwrap_or_else(|never: Infallible| match never {});
}

/// Executes a transaction with `tracer` attached and returns the tracer afterwards.
///
/// The state changes of the transaction are not committed to `db`.
pub fn transact_with_tracer<T: Tracer>(
    db: &mut CacheDB<EmptyDB>,
    tracer: T,
    caller: Address,
    callee: Option<Address>,
    data: Bytes,
    value: U256,
) -> (Result<ResultAndState, EVMError<Infallible>>, T) {
    let mut inspector = TracerInspector::new(tracer);
    let result = {
        let mut evm = EthEvmFactory::default().create_evm_with_inspector(
            db,
            EvmEnv::default(),
            &mut inspector,
        );
        let tx = TxEnv {
            caller,
            kind: callee.map_or(TxKind::Create, TxKind::Call),
            data,
            value,
            gas_limit: 1_000_000,
            ..Default::default()
        };
        evm.transact_raw(tx)
    };
    (result, inspector.into_tracer())
}
