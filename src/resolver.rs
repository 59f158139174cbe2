//! Path Resolver
//!
//! Pure functions mapping book identities and keys onto the filesystem.
//!
//! ## Layout
//! ```text
//! <location>/<book dir>/<key>.pt
//! ```
//! `<book dir>` is [`DEFAULT_BOOK_DIR`] for the default book and the book's
//! own name otherwise. Trailing separators on `<location>` are insignificant.

use std::path::{is_separator, Path, PathBuf};

use crate::error::{PaperError, Result};

/// Reserved name of the default book
pub const DEFAULT_BOOK_NAME: &str = "io.paperdb";

/// Folder holding the default book's entries
pub const DEFAULT_BOOK_DIR: &str = "io.paperdb";

/// Extension of every entry file, regardless of value type
pub const ENTRY_EXTENSION: &str = "pt";

/// Normalize a storage location.
///
/// Rebuilds the path from its components, which drops trailing separators
/// (`/sdcard/` becomes `/sdcard`) and collapses repeated ones.
pub fn normalize_location(location: &Path) -> PathBuf {
    location.components().collect()
}

/// Directory holding all entries of book `name` under `location`
pub fn resolve_book_dir(location: &Path, name: &str) -> PathBuf {
    let dir = if name == DEFAULT_BOOK_NAME {
        DEFAULT_BOOK_DIR
    } else {
        name
    };
    normalize_location(location).join(dir)
}

/// File backing `key` inside `book_dir`. Does not validate the key.
pub fn resolve_entry_path(book_dir: &Path, key: &str) -> PathBuf {
    book_dir.join(entry_file_name(key))
}

/// `<key>.pt`
pub fn entry_file_name(key: &str) -> String {
    format!("{}.{}", key, ENTRY_EXTENSION)
}

/// Inverse of [`entry_file_name`]: `"city.pt"` → `Some("city")`.
/// Files without the entry extension (temp files, strays) yield `None`.
pub fn key_from_file_name(file_name: &str) -> Option<&str> {
    let key = file_name
        .strip_suffix(ENTRY_EXTENSION)?
        .strip_suffix('.')?;
    (!key.is_empty()).then_some(key)
}

/// Reject keys that cannot map to exactly one file inside the book directory.
///
/// Empty keys, path separators and NUL bytes are refused. Everything else
/// (dots, `&`, `%`, `-`, spaces, ...) is a legal key.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.chars().any(is_separator) {
        "key contains a path separator"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(PaperError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// Check a name passed to the name-restricted accessor.
///
/// The default book is reachable only through the no-argument accessor, so
/// its reserved name is refused here.
pub fn validate_book_name(name: &str) -> Result<()> {
    if name == DEFAULT_BOOK_NAME {
        return Err(PaperError::ReservedName(name.to_string()));
    }
    check_book_dir_name(name)
}

/// Structural check applied to every book name, reserved or not.
pub fn check_book_dir_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "book name is empty"
    } else if name == "." || name == ".." {
        "book name refers to a relative directory"
    } else if name.chars().any(is_separator) {
        "book name contains a path separator"
    } else if name.contains('\0') {
        "book name contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(PaperError::InvalidBookName {
        name: name.to_string(),
        reason,
    })
}
