//! # Argus
//!
//! Security-telemetry batch engine: events stream into compressed,
//! self-describing batches keyed by an identifier bitmap, and come back
//! out either wholesale or filtered through a query bitmap.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Argus                              │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │ Ingest  │ →  │  Writer  │ →  │  Batch  │ →  │  Reader  │  │
//! │  │ (ids)   │    │ (intern, │    │ (sealed,│    │ (full or │  │
//! │  │         │    │ compress)│    │  ids)   │    │ selected)│  │
//! │  └─────────┘    └──────────┘    └─────────┘    └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```
//! use argus::{
//!     Bitmap, CompressionKind, Event, EventType, Ingestor, Reader,
//!     SequentialAllocator, Timestamp, Value,
//! };
//!
//! # fn main() -> Result<(), argus::IngestError> {
//! let mut ingestor = Ingestor::new(CompressionKind::Lz4, SequentialAllocator::new())?;
//! for n in 0..4u64 {
//!     let event = Event::new(
//!         EventType::Count,
//!         Value::Count(n),
//!         Timestamp::from_nanos(100 + n),
//!     );
//!     ingestor.write(&event)?;
//! }
//! let batch = ingestor.roll()?;
//!
//! // Pull out only the events with ids 2 and 3.
//! let query = Bitmap::from_range(2, 4);
//! let events = Reader::new(&batch)?.select(&query)?;
//! assert_eq!(events.len(), 2);
//! # Ok(())
//! # }
//! ```

mod cache;
mod ingest;

pub use cache::LruCache;
pub use ingest::{IdAllocator, IngestError, Ingestor, SequentialAllocator, stamp};

pub use argus_bitmap::{Bitmap, Bits};
pub use argus_storage::{Batch, Reader, StorageError, Writer};
pub use argus_types::{
    CompressionKind, Event, EventId, EventType, Field, PortProtocol, Timestamp, Value,
};
