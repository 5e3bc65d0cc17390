//! Job protocol client for a remote execution server.
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
#![allow(clippy::module_name_repetitions)]

//! The client drives one remote job end to end: announce the tool via
//! `setup`, stage inputs with `put_file`, `launch` the command line, poll
//! with `wait`/`get_status`, then pull results back with `fetch_output`.
//!
//! Layout: `client.rs` (the protocol client), `resolver.rs` (output
//! retrieval strategy), `retry.rs` (bounded fixed-backoff retry),
//! `codec.rs` (response decoding), `fs.rs` (local copy primitive).

pub mod client;
pub mod codec;
mod fs;
mod resolver;
pub mod retry;

pub use client::JobClient;
pub use retry::RetryPolicy;
