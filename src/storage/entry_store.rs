//! Entry Store
//!
//! Performs the filesystem work for one book directory.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::config::SyncStrategy;
use crate::error::{IoContext, PaperError, Result};
use crate::resolver::{self, ENTRY_EXTENSION};

use super::frame;
use super::KeyLocker;

/// Reads and writes the entries of a single book directory
///
/// ## Concurrency:
/// - `locker`: Per-key mutex around every operation touching one entry file
/// - `lifecycle`: RwLock; writes and deletes share it, `destroy` takes it
///   exclusively so a directory is never removed under a half-finished write
/// - Writes of different keys proceed in parallel (different files)
pub struct EntryStore<C> {
    /// Book directory (may not exist yet)
    dir: PathBuf,

    /// Shared, process-wide codec
    codec: Arc<C>,

    sync_strategy: SyncStrategy,

    stale_temp_age: Duration,

    locker: KeyLocker,

    lifecycle: RwLock<()>,

    /// Set once leftover temp files have been swept from `dir`
    swept: AtomicBool,

    /// Unique suffix for temp file names
    tmp_counter: AtomicU64,
}

impl<C: Codec> EntryStore<C> {
    pub fn new(
        dir: PathBuf,
        codec: Arc<C>,
        sync_strategy: SyncStrategy,
        stale_temp_age: Duration,
    ) -> Self {
        Self {
            dir,
            codec,
            sync_strategy,
            stale_temp_age,
            locker: KeyLocker::new(),
            lifecycle: RwLock::new(()),
            swept: AtomicBool::new(false),
            tmp_counter: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Persist `value` under `key`, replacing any previous value atomically.
    ///
    /// Steps:
    /// 1. Validate key, encode and frame the value (no I/O yet)
    /// 2. Create the book directory if missing
    /// 3. Write a temp file next to the entry, sync it
    /// 4. Rename over the entry file
    pub fn write<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + 'static,
    {
        resolver::validate_key(key)?;

        let payload = self
            .codec
            .encode(value)
            .map_err(|e| PaperError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let framed = frame::seal(&payload);

        let _lifecycle = self.lifecycle.read();
        let _guard = self.locker.lock(key);

        self.ensure_dir()?;

        let path = self.entry_path(key);
        let tmp = self.temp_path(key);
        if let Err(e) = self.replace_file(&tmp, &path, &framed) {
            // Clean up an unsuccessfully written temp file; the entry itself is untouched
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Couldn't remove temp file");
                }
            }
            return Err(e);
        }

        debug!(key, path = %path.display(), bytes = framed.len(), "Entry written");
        Ok(())
    }

    /// Like [`write`](Self::write), but an absent value is rejected with
    /// [`PaperError::NullValue`] and the current entry is left as it is.
    pub fn write_optional<T>(&self, key: &str, value: Option<&T>) -> Result<()>
    where
        T: Serialize + ?Sized + 'static,
    {
        resolver::validate_key(key)?;
        match value {
            Some(value) => self.write(key, value),
            None => Err(PaperError::NullValue {
                key: key.to_string(),
            }),
        }
    }

    /// Read `key`, failing with [`PaperError::KeyNotFound`] when absent
    pub fn read<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + 'static,
    {
        self.read_optional(key)?.ok_or_else(|| PaperError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Read `key`, returning `default` when absent
    pub fn read_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: DeserializeOwned + 'static,
    {
        Ok(self.read_optional(key)?.unwrap_or(default))
    }

    /// Read `key`; `Ok(None)` when absent.
    ///
    /// An undecodable file yields [`PaperError::Deserialization`] and is left
    /// on disk exactly as found.
    pub fn read_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        resolver::validate_key(key)?;
        let path = self.entry_path(key);

        let bytes = {
            let _guard = self.locker.lock(key);
            match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e).at(&path),
            }
        };

        let corrupt = |reason: String| PaperError::Deserialization {
            key: key.to_string(),
            path: path.clone(),
            reason,
        };

        let payload = frame::open(&bytes).map_err(corrupt)?;
        let value = self
            .codec
            .decode(payload)
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(Some(value))
    }

    /// Remove `key`; absent keys are a no-op
    pub fn delete(&self, key: &str) -> Result<()> {
        resolver::validate_key(key)?;
        let path = self.entry_path(key);

        let _lifecycle = self.lifecycle.read();
        let _guard = self.locker.lock(key);

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, path = %path.display(), "Entry deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).at(&path),
        }
    }

    /// Whether an entry file exists for `key`
    pub fn contains(&self, key: &str) -> Result<bool> {
        resolver::validate_key(key)?;
        let path = self.entry_path(key);

        let _guard = self.locker.lock(key);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).at(&path),
        }
    }

    /// Last modification of `key` in milliseconds since the Unix epoch, or `-1`.
    ///
    /// Only second granularity is guaranteed; some filesystems keep nothing finer.
    pub fn last_modified(&self, key: &str) -> Result<i64> {
        resolver::validate_key(key)?;
        let path = self.entry_path(key);

        let _guard = self.locker.lock(key);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(-1),
            Err(e) => return Err(e).at(&path),
        };
        let modified = meta.modified().at(&path)?;

        Ok(match modified.duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis())
                .map_or(i64::MIN, |ms| -ms),
        })
    }

    // =========================================================================
    // Book Operations
    // =========================================================================

    /// Remove the book directory and everything beneath it.
    ///
    /// A missing directory is fine. The store stays usable: the next write
    /// recreates the directory.
    pub fn destroy(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.write();

        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                debug!(path = %self.dir.display(), "Book destroyed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).at(&self.dir),
        }
    }

    /// Keys of all entry files directly inside the book directory
    pub fn list_keys(&self) -> Result<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e).at(&self.dir),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let entry = entry.at(&self.dir)?;

            // Entries may vanish between listing and stat; skip those
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e).at(&entry.path()),
            };
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            if let Some(key) = file_name.to_str().and_then(resolver::key_from_file_name) {
                keys.insert(key.to_string());
            }
        }

        Ok(keys)
    }

    /// Remove temp files older than `max_age` left by interrupted writes.
    ///
    /// Returns how many were removed. Failures on single files are logged,
    /// not returned.
    pub fn purge_stale_temp(&self, max_age: Duration) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).at(&self.dir),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_temp = entry
                .file_name()
                .to_str()
                .map_or(false, Self::is_temp_name);
            if !is_temp || !Self::is_stale(&path, now, max_age) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Couldn't purge temp file"),
            }
        }

        if removed > 0 {
            debug!(path = %self.dir.display(), removed, "Purged stale temp files");
        }
        Ok(removed)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Book directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key` (whether or not it exists)
    pub fn entry_path(&self, key: &str) -> PathBuf {
        resolver::resolve_entry_path(&self.dir, key)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).at(&self.dir)?;

        if !self.swept.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.purge_stale_temp(self.stale_temp_age) {
                warn!(path = %self.dir.display(), error = %e, "Temp file sweep failed");
            }
        }
        Ok(())
    }

    /// Write `bytes` to `tmp`, then move it over `target`
    fn replace_file(&self, tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(tmp)
                .at(tmp)?;
            file.write_all(bytes).at(tmp)?;
            if self.sync_strategy == SyncStrategy::EveryWrite {
                file.sync_all().at(tmp)?;
            }
        }

        fs::rename(tmp, target).at(target)?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.sync_dir();
        }
        Ok(())
    }

    /// Best effort: not every platform can open a directory for syncing
    fn sync_dir(&self) {
        match File::open(&self.dir) {
            Ok(dir) => {
                if let Err(e) = dir.sync_all() {
                    warn!(path = %self.dir.display(), error = %e, "Directory sync failed");
                }
            }
            Err(e) => warn!(path = %self.dir.display(), error = %e, "Directory open failed"),
        }
    }

    /// "city" → "city.pt.tmp.<pid>.<n>"
    fn temp_path(&self, key: &str) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.tmp.{}.{}",
            resolver::entry_file_name(key),
            std::process::id(),
            n
        ))
    }

    /// Matches only `<entry>.pt.tmp.<pid>.<n>`. Entry files always end in
    /// `.pt`, so a key that merely contains `.pt.tmp.` is never taken for one.
    fn is_temp_name(name: &str) -> bool {
        let marker = format!(".{}.tmp.", ENTRY_EXTENSION);
        let Some(start) = name.rfind(&marker) else {
            return false;
        };

        let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        let mut suffix = name[start + marker.len()..].split('.');
        match (suffix.next(), suffix.next(), suffix.next()) {
            (Some(pid), Some(n), None) => is_number(pid) && is_number(n),
            _ => false,
        }
    }

    fn is_stale(path: &Path, now: SystemTime, max_age: Duration) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO))
            .map_or(false, |age| age >= max_age)
    }
}

impl<C> std::fmt::Debug for EntryStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("dir", &self.dir)
            .field("sync_strategy", &self.sync_strategy)
            .finish()
    }
}
