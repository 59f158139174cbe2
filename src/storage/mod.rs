//! Storage Module
//!
//! One directory per book, one file per key.
//!
//! ## Responsibilities
//! - Atomic write/read/delete of individual entries
//! - Lazy creation and recursive destruction of the book directory
//! - Per-key locking so readers never race a replace of the same key
//! - Cleanup of temp files orphaned by a crashed writer
//!
//! ## Entry File Format (V1)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(1)│ CRC32 (4)    │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Payload (codec output, opaque)         │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## Write Path
//! ```text
//! encode → frame → <key>.pt.tmp.<pid>.<n> → fsync → rename → <key>.pt
//! ```
//! A reader sees either the previous file or the complete new one.

mod entry_store;
mod frame;
mod locker;

pub use entry_store::EntryStore;
pub use frame::{HEADER_SIZE, MAGIC, VERSION};
pub use locker::{KeyGuard, KeyLocker};
