//! `sload-evme` runs EVM bytecode against an in-memory state with a tracer attached and prints
//! the trace result.

use clap::Parser;

mod cmd;
mod error;
mod hex;
mod logging;
mod state;
mod watchdog;

use cmd::Cmd;
use error::EvmeError;

fn main() -> Result<(), EvmeError> {
    set_thread_panic_hook();
    let cmd = Cmd::parse();
    cmd.log_args.init()?;
    cmd.run().inspect_err(|e| eprintln!("{e}"))
}

/// Sets thread panic hook, so a panic on any thread ends the process.
fn set_thread_panic_hook() {
    use std::{
        backtrace::Backtrace,
        panic::{set_hook, take_hook},
        process::exit,
    };
    let orig_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        eprintln!("Custom backtrace: {}", Backtrace::capture());
        orig_hook(panic_info);
        exit(1);
    }));
}
