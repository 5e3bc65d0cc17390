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

//! Destination configuration for the offload client.
//!
//! A destination is an opaque parameter set describing one remote job
//! manager: connection details, the default file action, and submission
//! parameters forwarded verbatim at launch time.
//!
//! Layout: `model.rs` (typed destination model), `loader.rs` (construction
//! from maps and JSON files), `error.rs`.

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::DestinationConfig;
