//! Registry
//!
//! Owns the default storage root and hands out one [`Book`] per directory.
//!
//! ## Responsibilities
//! - Hold the (re-configurable) default root
//! - Memoize books by resolved directory, so every caller shares one handle
//! - Forward custom serializer registration to the shared codec
//!
//! ## Identity
//! The memo key is the normalized book directory, not the spelling used to
//! ask for it: `book_on("/sdcard/", "x")` and `book_on("/sdcard", "x")` return
//! the same `Arc`, and so does `book_named("x")` when the root is `/sdcard`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::book::Book;
use crate::codec::{BincodeCodec, Codec, Serializer};
use crate::config::Config;
use crate::error::{PaperError, Result};
use crate::resolver::{self, DEFAULT_BOOK_NAME};

/// Long-lived owner of book handles
///
/// Construct one per process (or per storage root set) and share it by
/// reference or `Arc`. All methods take `&self`.
///
/// ## Concurrency:
/// - `books`: Mutex held across lookup-or-create, so concurrent first
///   requests for one directory construct exactly one book
/// - `config`: RwLock, replaced wholesale by [`init`](Registry::init)
pub struct Registry<C = BincodeCodec> {
    config: RwLock<Config>,

    /// Shared by every book; registrations reach existing handles
    codec: Arc<C>,

    /// Normalized book directory → handle
    books: Mutex<HashMap<PathBuf, Arc<Book<C>>>>,
}

impl Registry<BincodeCodec> {
    /// Registry rooted at `root` with default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::open(Config::builder().root_dir(root).build())
    }

    /// Registry without a default root; call [`init`](Registry::init) before
    /// using [`book`](Registry::book) or [`book_named`](Registry::book_named)
    pub fn uninitialized() -> Self {
        Self::open(Config::default())
    }

    pub fn open(config: Config) -> Self {
        Self::with_codec(config, BincodeCodec::new())
    }
}

impl Default for Registry<BincodeCodec> {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl<C: Codec> Registry<C> {
    /// Registry using a custom codec
    pub fn with_codec(config: Config, codec: C) -> Self {
        Self {
            config: RwLock::new(config),
            codec: Arc::new(codec),
            books: Mutex::new(HashMap::new()),
        }
    }

    /// Set or replace the default root.
    ///
    /// Books already handed out keep their directory and their data.
    pub fn init(&self, root: impl Into<PathBuf>) {
        let root = root.into();
        info!(root = %root.display(), "Default storage root set");
        self.config.write().root_dir = Some(root);
    }

    /// Current default root
    pub fn root(&self) -> Option<PathBuf> {
        self.config.read().root_dir.clone()
    }

    // =========================================================================
    // Book Accessors
    // =========================================================================

    /// The default book under the default root
    pub fn book(&self) -> Result<Arc<Book<C>>> {
        let root = self.root().ok_or(PaperError::NotInitialized)?;
        self.get_book(&root, DEFAULT_BOOK_NAME)
    }

    /// Book `name` under the default root.
    ///
    /// The default book's reserved name is refused; use [`book`](Registry::book).
    pub fn book_named(&self, name: &str) -> Result<Arc<Book<C>>> {
        resolver::validate_book_name(name)?;
        let root = self.root().ok_or(PaperError::NotInitialized)?;
        self.get_book(&root, name)
    }

    /// The default book placed at a custom location (e.g. external storage)
    pub fn book_on(&self, location: impl AsRef<Path>) -> Result<Arc<Book<C>>> {
        self.get_book(location.as_ref(), DEFAULT_BOOK_NAME)
    }

    /// Book `name` placed at a custom location. Any name is accepted here,
    /// including the reserved one.
    pub fn book_on_named(&self, location: impl AsRef<Path>, name: &str) -> Result<Arc<Book<C>>> {
        self.get_book(location.as_ref(), name)
    }

    // =========================================================================
    // Serializers
    // =========================================================================

    /// Use `handler` for every value of type `T` read or written from now on,
    /// by every book of this registry. Higher `priority` wins.
    pub fn register<T: 'static>(&self, handler: Arc<dyn Serializer<T>>, priority: i32) {
        self.codec.register_handler(handler, priority);
    }

    pub fn codec(&self) -> &Arc<C> {
        &self.codec
    }

    /// Number of distinct books handed out so far
    pub fn book_count(&self) -> usize {
        self.books.lock().len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn get_book(&self, location: &Path, name: &str) -> Result<Arc<Book<C>>> {
        resolver::check_book_dir_name(name)?;
        let dir = resolver::resolve_book_dir(location, name);

        let mut books = self.books.lock();
        if let Some(book) = books.get(&dir) {
            return Ok(Arc::clone(book));
        }

        let config = self.config.read().clone();
        let book = Arc::new(Book::new(dir.clone(), name, Arc::clone(&self.codec), &config));
        debug!(book = name, path = %dir.display(), "Book opened");

        books.insert(dir, Arc::clone(&book));
        Ok(book)
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &*self.config.read())
            .field("books", &self.books.lock().len())
            .finish()
    }
}
