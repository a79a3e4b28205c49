//! Identifier allocation and batch labeling.
//!
//! A sealed batch is unlabeled until the identifier service hands it a
//! dense range. [`stamp`] requests exactly `events` identifiers and
//! attaches them; a short allocation aborts the batch rather than
//! mislabeling it. [`Ingestor`] composes a [`Writer`] with an allocator
//! so every rolled batch comes out labeled.

use tracing::debug;

use argus_storage::{Batch, StorageError, Writer};
use argus_types::{CompressionKind, Event, EventType};

use crate::cache::LruCache;

/// Result alias for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Schemas kept across batch boundaries per ingestor.
const SCHEMA_CACHE_CAPACITY: usize = 128;

/// Errors surfaced by the ingest path.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    /// The identifier space has no `n` more identifiers to hand out.
    #[error("identifier space exhausted")]
    IdExhausted,

    /// The identifier service returned fewer identifiers than requested.
    #[error("identifier service returned {got} ids, {needed} needed")]
    ShortAllocation { needed: u64, got: u64 },

    /// The batch layer failed underneath.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Hands out half-open identifier ranges on demand.
///
/// Implementations must never return a range containing the reserved
/// invalid identifier `0`.
pub trait IdAllocator {
    /// Returns `(from, to)` with `to - from >= n`.
    fn request(&mut self, n: u64) -> Result<(u64, u64)>;
}

/// In-process allocator handing out consecutive ranges, starting just
/// past the reserved invalid identifier.
#[derive(Debug, Clone)]
pub struct SequentialAllocator {
    next: u64,
}

impl SequentialAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resumes allocation after the given identifier.
    pub fn starting_at(next: u64) -> Self {
        debug_assert!(next > 0);
        Self { next }
    }
}

impl Default for SequentialAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialAllocator {
    fn request(&mut self, n: u64) -> Result<(u64, u64)> {
        let from = self.next;
        let to = from.checked_add(n).ok_or(IngestError::IdExhausted)?;
        self.next = to;
        Ok((from, to))
    }
}

/// Requests identifiers for a sealed batch and attaches them as a dense
/// range.
pub fn stamp(batch: &mut Batch, allocator: &mut dyn IdAllocator) -> Result<()> {
    let needed = batch.events();
    let (from, to) = allocator.request(needed)?;
    if to - from < needed {
        return Err(IngestError::ShortAllocation {
            needed,
            got: to - from,
        });
    }
    let attached = batch.set_id_range(from, from + needed);
    debug_assert!(attached);
    debug!(from, to = from + needed, "stamped batch");
    Ok(())
}

/// Accumulates events into batches and labels each one on roll-over.
pub struct Ingestor<A> {
    writer: Writer,
    allocator: A,
    schemas: LruCache<String, EventType>,
}

impl<A: IdAllocator> Ingestor<A> {
    pub fn new(method: CompressionKind, allocator: A) -> Result<Self> {
        Ok(Self {
            writer: Writer::new(method)?,
            allocator,
            schemas: LruCache::new(SCHEMA_CACHE_CAPACITY),
        })
    }

    /// Appends one event to the in-progress batch.
    pub fn write(&mut self, event: &Event) -> Result<()> {
        Ok(self.writer.write(event)?)
    }

    /// Events accumulated since the last roll.
    pub fn events(&self) -> u64 {
        self.writer.events()
    }

    /// Seals the in-progress batch and attaches freshly allocated
    /// identifiers. The ingestor is immediately ready for more events.
    pub fn roll(&mut self) -> Result<Batch> {
        let mut batch = self.writer.seal()?;
        stamp(&mut batch, &mut self.allocator)?;
        Ok(batch)
    }

    /// Remembers a named schema for reuse across batches. Returns
    /// `false` if the name is already cached.
    pub fn register_schema(&mut self, name: impl Into<String>, ty: EventType) -> bool {
        self.schemas.insert(name.into(), ty)
    }

    /// Looks up a previously registered schema, refreshing its recency.
    pub fn schema(&mut self, name: &str) -> Option<&EventType> {
        self.schemas.lookup(name)
    }
}
