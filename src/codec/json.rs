//! JSON codec
//!
//! Human-readable entry files, handy when books are inspected or edited by hand.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Codec, CodecError, HandlerTable, Serializer};

/// `serde_json` codec with the same handler semantics as [`BincodeCodec`](super::BincodeCodec)
#[derive(Debug, Default)]
pub struct JsonCodec {
    handlers: HandlerTable,
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output
    pub fn pretty() -> Self {
        Self {
            handlers: HandlerTable::new(),
            pretty: true,
        }
    }
}

impl Codec for JsonCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized + 'static,
    {
        if let Some(encode) = self.handlers.lookup_encoder::<T>() {
            return encode(value);
        }
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned + 'static,
    {
        if let Some(handler) = self.handlers.lookup::<T>() {
            return handler.deserialize(bytes);
        }
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn register_handler<T: 'static>(&self, handler: Arc<dyn Serializer<T>>, priority: i32) {
        self.handlers.register(handler, priority);
    }
}
