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

//! Shared data access layer for Marquee: migrations, the device registry, and
//! read-only display feeds.

pub mod devices;
pub mod error;
pub mod feed;
pub mod store;

pub use devices::{DeviceRecord, DeviceRegistry, SqliteDeviceRegistry};
pub use error::{DataError, RegistryError, RegistryResult, Result as DataResult};
pub use feed::{FeedStore, LastMessage, MatchRow, NO_MESSAGE, TickerRow};
pub use store::Database;
