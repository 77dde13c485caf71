//! A selective prestate tracer for revm.
//!
//! [`SloadTracer`] watches a single transaction and records every account and storage slot
//! that was read through `SLOAD`, together with the value the slot held before the
//! transaction touched it. The tracer is host-agnostic: it implements the [`Tracer`] hook set,
//! and [`TracerInspector`] plugs any [`Tracer`] into revm as an [`revm::Inspector`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::*;

mod inspector;
pub use inspector::*;

mod interrupt;
pub use interrupt::*;

mod prestate;
pub use prestate::*;

mod registry;
pub use registry::*;

mod result;
pub use result::*;

mod sload;
pub use sload::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod tracer;
pub use tracer::*;
