use std::{path::PathBuf, time::Duration};

use alloy_evm::{eth::EthEvmFactory, Evm, EvmEnv, EvmFactory};
use alloy_primitives::{Address, Bytes, TxKind, U256};
use clap::Parser;
use revm::{
    context::{
        result::{ExecutionResult, ResultAndState},
        TxEnv,
    },
    database::{CacheDB, EmptyDB},
};
use sload_tracer::{SloadTracer, Tracer, TracerInspector, TracerOutput, TracerRegistry};
use tracing::{info, warn};

use crate::{
    error::{EvmeError, Result},
    hex::load_hex,
    logging::LogArgs,
    state::{create_database, PreStateArgs},
    watchdog::{parse_duration, Watchdog},
};

/// Run EVM bytecode with a tracer attached and print the trace result
#[derive(Parser, Debug)]
#[command(name = "sload-evme", version, about)]
pub(crate) struct Cmd {
    /// EVM bytecode as hex string (positional argument)
    #[arg(value_name = "CODE")]
    pub(crate) code: Option<String>,

    /// File containing EVM code. If '-' is specified, code is read from stdin
    #[arg(long = "codefile")]
    pub(crate) codefile: Option<String>,

    /// Indicates the action should be create rather than call
    #[arg(long = "create")]
    pub(crate) create: bool,

    /// Gas limit for the evm
    #[arg(long = "gas", default_value = "10000000")]
    pub(crate) gas: u64,

    /// Input for the EVM (hex string)
    #[arg(long = "input")]
    pub(crate) input: Option<String>,

    /// File containing input for the EVM
    #[arg(long = "inputfile")]
    pub(crate) inputfile: Option<String>,

    /// The transaction receiver (execution context)
    #[arg(long = "receiver", visible_aliases = ["to"], default_value = "0x0000000000000000000000000000000000000000")]
    pub(crate) receiver: Address,

    /// The transaction origin
    #[arg(long = "sender", visible_aliases = ["from"], default_value = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")]
    pub(crate) sender: Address,

    /// Value set for the evm
    #[arg(long = "value", default_value = "0")]
    pub(crate) value: U256,

    /// Name of the tracer to attach
    #[arg(long = "tracer", default_value = SloadTracer::NAME)]
    pub(crate) tracer: String,

    /// Stop the tracer after this long (e.g. `500ms`, `5s`, `1m`)
    #[arg(long = "timeout", value_parser = parse_duration)]
    pub(crate) timeout: Option<Duration>,

    /// Write the trace result to this file instead of stdout
    #[arg(long = "output", short = 'o')]
    pub(crate) output: Option<PathBuf>,

    /// Pre-execution state configuration
    #[command(flatten)]
    pub(crate) prestate_args: PreStateArgs,

    /// Logging configuration
    #[command(flatten)]
    pub(crate) log_args: LogArgs,
}

impl Cmd {
    /// Execute the run command
    pub(crate) fn run(&self) -> Result<()> {
        let output = self.trace()?;
        if let Some(reason) = &output.interrupted {
            warn!(%reason, "Tracer was stopped before execution finished");
            eprintln!("warning: tracer stopped: {reason}");
        }

        let rendered = serde_json::to_string_pretty(&output.result)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)?;
                info!(path = ?path, "Trace result written");
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }

    /// Load the inputs, execute the transaction and render the trace.
    pub(crate) fn trace(&self) -> Result<TracerOutput> {
        let code = load_hex(self.code.as_deref(), self.codefile.as_deref())?.unwrap_or_default();
        let input = load_hex(self.input.as_deref(), self.inputfile.as_deref())?.unwrap_or_default();

        let mut accounts = self.prestate_args.load_accounts(self.sender)?;
        // If not in create mode, the code runs at the receiver address
        if !self.create && !code.is_empty() {
            accounts.entry(self.receiver).or_default().code = code.clone();
        }
        let nonce = accounts.get(&self.sender).map_or(0, |account| account.nonce);
        let mut db = create_database(&accounts);

        let tracer = TracerRegistry::native().create(&self.tracer)?;
        let watchdog = self.timeout.map(|timeout| Watchdog::spawn(timeout, tracer.interrupt_handle()));
        let executed = self.execute(&mut db, tracer, self.tx_env(code, input, nonce));
        if let Some(watchdog) = watchdog {
            watchdog.finish();
        }

        let (result, tracer) = executed?;
        info!(
            success = result.is_success(),
            gas_used = result.gas_used(),
            "Transaction executed"
        );
        Ok(tracer.result()?)
    }

    fn tx_env(&self, code: Bytes, input: Bytes, nonce: u64) -> TxEnv {
        let (kind, data) = if self.create {
            // Init code comes from CODE, falling back to the input
            (TxKind::Create, if code.is_empty() { input } else { code })
        } else {
            (TxKind::Call(self.receiver), input)
        };
        TxEnv {
            caller: self.sender,
            kind,
            data,
            value: self.value,
            gas_limit: self.gas,
            nonce,
            ..Default::default()
        }
    }

    fn execute<T: Tracer>(
        &self,
        db: &mut CacheDB<EmptyDB>,
        tracer: T,
        tx: TxEnv,
    ) -> Result<(ExecutionResult, T)> {
        let mut inspector = TracerInspector::new(tracer);
        let result = {
            let mut evm = EthEvmFactory::default().create_evm_with_inspector(
                db,
                EvmEnv::default(),
                &mut inspector,
            );
            evm.transact_raw(tx)
        };
        let ResultAndState { result, .. } =
            result.map_err(|e| EvmeError::ExecutionError(e.to_string()))?;
        Ok((result, inspector.into_tracer()))
    }
}
