//! # PaperDB
//!
//! A lightweight, file-backed object store:
//! - Every value lives in its own file, `<location>/<book>/<key>.pt`
//! - Atomic replace on write (temp file + rename), CRC-checked reads
//! - Pluggable codec with priority-ordered custom serializers
//! - One shared handle per book directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Registry                             │
//! │        (default root, Book memoization, serializers)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Arc<Book>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                           Book                               │
//! │                 (per-namespace handle)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        EntryStore                            │
//! │              (KeyLocker, atomic file replace)                │
//! └──────────┬───────────────────────────────────┬──────────────┘
//!            │                                   │
//!            ▼                                   ▼
//!   ┌─────────────────┐                 ┌─────────────────┐
//!   │  PathResolver   │                 │      Codec      │
//!   │  (key → file)   │                 │ (value ↔ bytes) │
//!   └─────────────────┘                 └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use paperdb::Registry;
//!
//! # fn main() -> paperdb::Result<()> {
//! let paper = Registry::new("/var/lib/myapp");
//!
//! paper.book()?.write("city", &"Lund".to_string())?;
//! let city: String = paper.book()?.read("city")?;
//!
//! let contacts = paper.book_named("contacts")?;
//! contacts.write("count", &3u32)?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod resolver;
pub mod codec;
pub mod storage;
pub mod book;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PaperError, Result};
pub use config::{Config, SyncStrategy};
pub use codec::{BincodeCodec, Codec, CodecError, JsonCodec, Serializer};
pub use book::Book;
pub use registry::Registry;
pub use resolver::{DEFAULT_BOOK_DIR, DEFAULT_BOOK_NAME, ENTRY_EXTENSION};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PaperDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
