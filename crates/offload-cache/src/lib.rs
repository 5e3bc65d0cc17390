//! Input-staging deduplication for the offload client.
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

//! When many concurrent jobs stage the same input file, exactly one transfer
//! to the remote cache should happen; everyone else waits for its outcome.
//! The [`TransferCoordinator`] arbitrates ownership per canonical source
//! path, and [`CachingJobClient`] routes `put_file` uploads through it.

pub mod client;
pub mod coordinator;

pub use client::{CacheTransfer, CachingJobClient};
pub use coordinator::{TransferCoordinator, TransferRole, TransferSlot};
