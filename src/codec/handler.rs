//! Custom type handlers
//!
//! Type-erased, priority-ordered table of [`Serializer`]s keyed by `TypeId`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::CodecError;

/// Hand-written encoding for one value type, overriding the codec's default
pub trait Serializer<T>: Send + Sync + 'static {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Encoding half of a handler, callable for unsized value types too
pub(crate) type Encoder<T> = Arc<dyn Fn(&T) -> Result<Vec<u8>, CodecError> + Send + Sync>;

struct Registration {
    priority: i32,
    seq: u64,
    /// Always an `Arc<dyn Serializer<T>>` for the `TypeId` it is filed under
    handler: Arc<dyn Any + Send + Sync>,
    /// Always an `Encoder<T>` wrapping `handler`
    encoder: Arc<dyn Any + Send + Sync>,
}

/// Registered handlers, best candidate first for each type
///
/// ## Concurrency:
/// - `entries`: RwLock (lookups on every read/write, registrations are rare)
/// - `next_seq`: Atomic counter breaking priority ties
#[derive(Default)]
pub struct HandlerTable {
    entries: RwLock<HashMap<TypeId, Vec<Registration>>>,
    next_seq: AtomicU64,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `handler` under `T`, keeping the slot sorted by (priority, recency)
    pub fn register<T: 'static>(&self, handler: Arc<dyn Serializer<T>>, priority: i32) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let encode_with = Arc::clone(&handler);
        let encoder: Encoder<T> = Arc::new(move |value: &T| encode_with.serialize(value));
        let registration = Registration {
            priority,
            seq,
            handler: Arc::new(handler),
            encoder: Arc::new(encoder),
        };

        let mut entries = self.entries.write();
        let slot = entries.entry(TypeId::of::<T>()).or_default();
        slot.push(registration);
        slot.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.seq.cmp(&a.seq)));

        tracing::debug!(
            type_name = std::any::type_name::<T>(),
            priority,
            candidates = slot.len(),
            "Registered custom serializer"
        );
    }

    /// Highest-priority handler for `T`, if any
    pub fn lookup<T: 'static>(&self) -> Option<Arc<dyn Serializer<T>>> {
        let entries = self.entries.read();
        entries
            .get(&TypeId::of::<T>())?
            .first()?
            .handler
            .downcast_ref::<Arc<dyn Serializer<T>>>()
            .cloned()
    }

    /// Encoder of the highest-priority handler for `T`.
    ///
    /// Unsized types (`[T]`, `str`) never have one and fall through to the
    /// codec's own format.
    pub(crate) fn lookup_encoder<T: ?Sized + 'static>(&self) -> Option<Encoder<T>> {
        let entries = self.entries.read();
        entries
            .get(&TypeId::of::<T>())?
            .first()?
            .encoder
            .downcast_ref::<Encoder<T>>()
            .cloned()
    }

    /// Number of handlers registered for `T`
    pub fn count<T: 'static>(&self) -> usize {
        self.entries
            .read()
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("HandlerTable")
            .field("types", &entries.len())
            .finish()
    }
}
