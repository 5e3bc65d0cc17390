#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers for the offload client crates.
//! Layout: `mocks.rs` (scripted fake transports), `fixtures.rs` (logging and
//! filesystem helpers).

pub mod fixtures;
pub mod mocks;

pub use mocks::{ScriptedTransport, TransportCall};
