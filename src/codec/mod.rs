//! Codec Module
//!
//! Turns typed values into bytes and back.
//!
//! ## Responsibilities
//! - Encode any `serde::Serialize` value to a byte payload
//! - Decode a payload into the type the caller asks for
//! - Let callers register priority-ordered handlers for specific types
//!
//! The storage engine never looks inside a payload. It only calls [`Codec`],
//! so the wire format is swappable: [`BincodeCodec`] is the default and
//! [`JsonCodec`] trades size for readability.
//!
//! ## Shape Preservation
//! The type parameter of [`Codec::decode`] is the expected shape. A value
//! read back as the type it was written with keeps that type (`VecDeque`
//! stays `VecDeque`, `BTreeSet` stays `BTreeSet`). Views such as a slice
//! `&v[1..3]`, `str` or `Cow::Borrowed` encode like their owned container and
//! come back as it (`Vec<T>`, `String`), since the view itself cannot be rebuilt.

mod binary;
mod handler;
mod json;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use binary::BincodeCodec;
pub use handler::{HandlerTable, Serializer};
pub use json::JsonCodec;

/// Failure reported by a codec or a registered handler
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Serialization capability consumed by the storage engine
///
/// Implementations are shared process-wide (one instance behind an `Arc` in
/// the [`Registry`](crate::Registry)), so a handler registered once is seen
/// by every book, including books obtained before the registration.
pub trait Codec: Send + Sync + 'static {
    /// Encode a value into a self-contained payload. Unsized views such as
    /// `[T]` and `str` are accepted and encode like their owned container.
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized + 'static;

    /// Decode a payload as `T`
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned + 'static;

    /// Register a custom handler for `T`.
    ///
    /// When several handlers exist for the same type, the highest `priority`
    /// wins; equal priorities go to the most recent registration.
    fn register_handler<T: 'static>(&self, handler: Arc<dyn Serializer<T>>, priority: i32);
}
