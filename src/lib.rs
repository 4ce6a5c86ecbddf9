#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::explicit_iter_loop,
    clippy::todo,
    clippy::unimplemented,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::print_stdout,
    missing_debug_implementations,
    unused_crate_dependencies,
    unreachable_pub,
    missing_docs
)]

mod errors;
pub use errors::Error;

mod wire;

mod limits;
pub use limits::*;

mod envelope;
pub use envelope::*;

mod procedure;
pub use procedure::Procedure;

pub mod proto;

mod hypervisor;
pub use hypervisor::*;

mod sasl;
pub use sasl::*;

mod session;
pub use session::*;

mod handlers;

mod dispatch;
pub use dispatch::{dispatch_request, FatalError};

// Unused crate lint workaround for dev dependency.
#[cfg(test)]
use criterion as _;
