//! Configuration for PaperDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a [`Registry`](crate::Registry)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Default storage root. Books requested without an explicit location live here.
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── io.paperdb/      (default book)
    ///     │   └── <key>.pt
    ///     └── <book name>/     (named books)
    ///         └── <key>.pt
    pub root_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// How hard each entry write pushes data to the device
    pub sync_strategy: SyncStrategy,

    /// Temp files left behind by a crashed writer are removed once older than this
    pub stale_temp_age: Duration,
}

/// Sync strategy applied to every entry write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync the entry file before the rename and the book directory after it
    EveryWrite,

    /// Leave flushing to the OS page cache (rename is still atomic)
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: None,
            sync_strategy: SyncStrategy::EveryWrite,
            stale_temp_age: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the default storage root
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = Some(path.into());
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the age after which orphaned temp files are purged
    pub fn stale_temp_age(mut self, age: Duration) -> Self {
        self.config.stale_temp_age = age;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
