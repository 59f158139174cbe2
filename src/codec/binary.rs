//! Bincode codec
//!
//! Compact binary encoding; the default for every book.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Codec, CodecError, HandlerTable, Serializer};

/// Default codec: registered handlers first, then `bincode`
#[derive(Debug, Default)]
pub struct BincodeCodec {
    handlers: HandlerTable,
}

impl BincodeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }
}

impl Codec for BincodeCodec {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized + 'static,
    {
        if let Some(encode) = self.handlers.lookup_encoder::<T>() {
            return encode(value);
        }
        bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned + 'static,
    {
        if let Some(handler) = self.handlers.lookup::<T>() {
            return handler.deserialize(bytes);
        }
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn register_handler<T: 'static>(&self, handler: Arc<dyn Serializer<T>>, priority: i32) {
        self.handlers.register(handler, priority);
    }
}
