//! Book
//!
//! The public handle for one namespace of entries.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BincodeCodec, Codec};
use crate::config::Config;
use crate::error::Result;
use crate::resolver;
use crate::storage::EntryStore;

/// A namespace of entries backed by one directory
///
/// Books are handed out by the [`Registry`](crate::Registry) as `Arc<Book>`;
/// asking twice for the same directory yields the same handle. A book stays
/// valid after [`destroy`](Book::destroy) and after the registry is re-initialized.
#[derive(Debug)]
pub struct Book<C = BincodeCodec> {
    name: String,
    store: EntryStore<C>,
}

impl<C: Codec> Book<C> {
    pub(crate) fn new(dir: PathBuf, name: &str, codec: Arc<C>, config: &Config) -> Self {
        Self {
            name: name.to_string(),
            store: EntryStore::new(dir, codec, config.sync_strategy, config.stale_temp_age),
        }
    }

    /// Saves any serializable value under `key`, replacing the previous one.
    ///
    /// The key becomes part of the file name, so it must be non-empty and free
    /// of path separators.
    pub fn write<T>(&self, key: &str, value: &T) -> Result<&Self>
    where
        T: Serialize + ?Sized + 'static,
    {
        self.store.write(key, value)?;
        Ok(self)
    }

    /// Saves `value` if present; `None` fails with
    /// [`PaperError::NullValue`](crate::PaperError::NullValue) and keeps the old value.
    pub fn write_optional<T>(&self, key: &str, value: Option<&T>) -> Result<&Self>
    where
        T: Serialize + ?Sized + 'static,
    {
        self.store.write_optional(key, value)?;
        Ok(self)
    }

    /// Instantiates the saved value as `T`.
    ///
    /// Fails with [`PaperError::KeyNotFound`](crate::PaperError::KeyNotFound)
    /// when nothing is saved under `key`.
    pub fn read<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + 'static,
    {
        self.store.read(key)
    }

    /// Same as [`read`](Self::read), but `default` is returned if the key doesn't exist
    pub fn read_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: DeserializeOwned + 'static,
    {
        self.store.read_or(key, default)
    }

    /// The saved value, or `None` if the key doesn't exist
    pub fn read_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        self.store.read_optional(key)
    }

    /// Delete the saved value for `key` if it exists
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key)
    }

    /// Checks if an object with the given key is saved in this book
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.store.contains(key)
    }

    /// Destroys all data saved in this book. The book remains usable.
    pub fn destroy(&self) -> Result<()> {
        self.store.destroy()
    }

    /// Keys of all values saved in this book
    pub fn all_keys(&self) -> Result<BTreeSet<String>> {
        self.store.list_keys()
    }

    /// Timestamp of the last write of `key` in ms, or `-1` if it doesn't exist.
    /// Only second granularity is guaranteed.
    pub fn last_modified(&self, key: &str) -> Result<i64> {
        self.store.last_modified(key)
    }

    /// Folder holding the `*.pt` files of this book. Handy for export/import;
    /// it doesn't exist until something has been written.
    pub fn path(&self) -> &Path {
        self.store.dir()
    }

    /// The `*.pt` file holding the value for `key`, whether or not it exists
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.store.entry_path(key)
    }

    /// Name this book was requested with ([`DEFAULT_BOOK_NAME`](resolver::DEFAULT_BOOK_NAME)
    /// for the default book)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name == resolver::DEFAULT_BOOK_NAME
    }

    /// Remove temp files abandoned by interrupted writes; see
    /// [`EntryStore::purge_stale_temp`]
    pub fn purge_stale_temp(&self, max_age: std::time::Duration) -> Result<usize> {
        self.store.purge_stale_temp(max_age)
    }
}
