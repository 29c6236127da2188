//! Filesystem side of Marquee: serving the restricted namespace, relocating
//! uploaded batches into it, and purging it.
#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

pub mod cleanup;
pub mod error;
pub mod ingest;
pub mod lock;
pub mod relocate;
pub mod resolver;
pub mod staging;

pub use cleanup::{BatchCleanup, CleanupFailure, CleanupReport, purge_all};
pub use error::{FsOpsError, FsOpsResult};
pub use ingest::{
    BatchHandle, BatchOutcome, ErrorKind, IngestionBarrier, IngestionBatch, ItemFailure,
    UploadItem, validate_name,
};
pub use lock::NamespaceLock;
pub use relocate::{FsRelocator, RelocateError, Relocator};
pub use resolver::{OpenedResource, list_files, open, resolve};
pub use staging::StagingArea;
