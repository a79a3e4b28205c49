//! # argus-storage: Compressed event-batch storage and retrieval
//!
//! Events stream into a [`Writer`], which interns their types, tracks the
//! timestamp range and pushes the serialized form through a compression
//! filter. Sealing yields an immutable [`Batch`] — an opaque compressed
//! payload plus its envelope (codec, event count, timestamp range and an
//! identifier bitmap). A [`Reader`] materializes events back out, either
//! wholesale or filtered through a query bitmap without touching events
//! the query does not demand.

mod batch;
mod codec;
mod wire;

pub use batch::{Batch, Reader, Writer};
pub use codec::{CompressedSink, decompress};

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by the batch codec.
///
/// Identifier-attachment rank mismatches are not errors — they are the
/// boolean-return case of [`Batch::set_id_range`] and
/// [`Batch::set_id_bitmap`], reported before any mutation.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    /// The compression filter rejected a write or flush.
    #[error("{codec} compression failed: {reason}")]
    Compression {
        codec: &'static str,
        reason: String,
    },

    /// The decompression filter rejected the payload.
    #[error("{codec} decompression failed: {reason}")]
    Decompression {
        codec: &'static str,
        reason: String,
    },

    /// A value did not serialize.
    #[error("event encoding failed: {reason}")]
    Encode { reason: String },

    /// The payload contained a malformed value.
    #[error("malformed event payload: {reason}")]
    Decode { reason: String },

    /// The payload ended in the middle of an event record.
    #[error("unexpected end of payload")]
    UnexpectedEof,

    /// A type reference with no preceding descriptor in this batch.
    #[error("type id {id} has no descriptor in this batch")]
    UnknownTypeId { id: u32 },

    /// Materialization was requested on a fully consumed batch. Used as a
    /// termination signal internally; callers of the bulk reads never
    /// observe it.
    #[error("batch exhausted")]
    Exhausted,
}
