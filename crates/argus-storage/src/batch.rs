//! Event batches: writing, sealing and reading back.
//!
//! A batch payload is a concatenation of event records on the
//! uncompressed stream:
//!
//! ```text
//! record   := type_ref timestamp value
//! type_ref := type_id                     -- subsequent occurrences
//!           | type_id type_descriptor    -- first occurrence in this batch
//! ```
//!
//! Type ids are assigned densely starting at 0 in first-seen order, so a
//! reader can tell the two forms apart by comparing the id against its
//! dictionary size. Event identifiers never appear on the wire: they are
//! implied by payload order and looked up from the batch's identifier
//! bitmap at materialization time.

use std::collections::HashMap;
use std::mem;

use bytes::Bytes;
use tracing::{debug, trace};

use argus_bitmap::{Bitmap, Bits, Ones};
use argus_types::{CompressionKind, Event, EventId, EventType, Timestamp, Value};

use crate::codec::{self, CompressedSink};
use crate::wire::{self, Decoder};
use crate::{Result, StorageError};

/// An immutable, compressed container of events.
///
/// The envelope carries the compression method, the event count, the
/// timestamp range (`first = Timestamp::MAX`, `last = Timestamp::MIN`
/// when empty) and an identifier bitmap whose *k*-th set bit is the
/// identifier of the *k*-th event in payload order. Sealed batches are
/// never mutated; attaching identifiers replaces only the `ids` field and
/// is rank-checked.
#[derive(Debug, Clone)]
pub struct Batch {
    method: CompressionKind,
    payload: Bytes,
    events: u64,
    first: Timestamp,
    last: Timestamp,
    ids: Bitmap,
}

impl Batch {
    /// The codec the payload was compressed with.
    pub fn method(&self) -> CompressionKind {
        self.method
    }

    /// The compressed payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The number of events in the payload.
    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// The smallest event timestamp ([`Timestamp::MAX`] when empty).
    pub fn first(&self) -> Timestamp {
        self.first
    }

    /// The largest event timestamp ([`Timestamp::MIN`] when empty).
    pub fn last(&self) -> Timestamp {
        self.last
    }

    /// The identifier bitmap (empty until identifiers are attached).
    pub fn ids(&self) -> &Bitmap {
        &self.ids
    }

    /// Attaches the dense identifier range `[begin, end)`.
    ///
    /// Returns `false` without mutating the batch unless
    /// `end - begin == events`.
    pub fn set_id_range(&mut self, begin: u64, end: u64) -> bool {
        debug_assert!(begin <= end);
        if end - begin != self.events {
            return false;
        }
        self.ids = Bitmap::from_range(begin, end);
        true
    }

    /// Attaches an explicit identifier bitmap.
    ///
    /// Returns `false` without mutating the batch unless the bitmap's
    /// rank equals the event count.
    pub fn set_id_bitmap(&mut self, ids: Bitmap) -> bool {
        if ids.rank() != self.events {
            return false;
        }
        self.ids = ids;
        true
    }
}

/// Streams events into a compressed batch payload.
///
/// Each distinct event type is interned on first sight: its descriptor
/// goes on the wire once, subsequent events of that type carry only the
/// dense integer id. The event's own identifier field is ignored —
/// identifiers are assigned at read time from the batch's bitmap.
pub struct Writer {
    method: CompressionKind,
    sink: CompressedSink,
    dictionary: HashMap<EventType, u32>,
    events: u64,
    first: Timestamp,
    last: Timestamp,
}

impl Writer {
    /// Creates a writer that compresses payloads with `method`.
    pub fn new(method: CompressionKind) -> Result<Self> {
        Ok(Self {
            method,
            sink: CompressedSink::new(method)?,
            dictionary: HashMap::new(),
            events: 0,
            first: Timestamp::MAX,
            last: Timestamp::MIN,
        })
    }

    pub fn method(&self) -> CompressionKind {
        self.method
    }

    /// The number of events written since the last seal.
    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Serializes one event into the in-progress batch.
    pub fn write(&mut self, event: &Event) -> Result<()> {
        let ts = event.timestamp();
        if ts < self.first {
            self.first = ts;
        }
        if ts > self.last {
            self.last = ts;
        }
        match self.dictionary.get(event.event_type()) {
            Some(&id) => wire::emit(&mut self.sink, &id)?,
            None => {
                let id = self.dictionary.len() as u32;
                self.dictionary.insert(event.event_type().clone(), id);
                wire::emit(&mut self.sink, &id)?;
                wire::emit(&mut self.sink, event.event_type())?;
                trace!(type_id = id, "interned event type");
            }
        }
        wire::emit(&mut self.sink, &event.timestamp())?;
        wire::emit(&mut self.sink, event.value())?;
        self.events += 1;
        Ok(())
    }

    /// Flushes the compression filter and moves the finished batch out.
    ///
    /// The writer resets and is immediately reusable with the same
    /// method and an empty type dictionary.
    pub fn seal(&mut self) -> Result<Batch> {
        let sink = mem::replace(&mut self.sink, CompressedSink::new(self.method)?);
        let payload = sink.finish()?;
        self.dictionary.clear();
        let batch = Batch {
            method: self.method,
            payload: Bytes::from(payload),
            events: mem::take(&mut self.events),
            first: mem::replace(&mut self.first, Timestamp::MAX),
            last: mem::replace(&mut self.last, Timestamp::MIN),
            ids: Bitmap::new(),
        };
        debug!(
            events = batch.events,
            bytes = batch.payload.len(),
            method = %batch.method,
            "sealed batch"
        );
        Ok(batch)
    }
}

/// Materializes events back out of a sealed batch.
///
/// The reader borrows the batch for its lifetime; any number of readers
/// may consume the same batch concurrently, each with its own
/// decompression and dictionary state.
pub struct Reader<'a> {
    batch: &'a Batch,
    buf: Vec<u8>,
    pos: usize,
    dictionary: Vec<EventType>,
    available: u64,
    id_cursor: Ones<'a>,
}

impl<'a> Reader<'a> {
    /// Opens a reader over a sealed batch, inverting the compression
    /// filter.
    pub fn new(batch: &'a Batch) -> Result<Self> {
        let buf = codec::decompress(batch.method(), batch.payload())?;
        debug!(
            events = batch.events(),
            compressed = batch.payload().len(),
            decompressed = buf.len(),
            "opened batch reader"
        );
        Ok(Self {
            batch,
            buf,
            pos: 0,
            dictionary: Vec::new(),
            available: batch.events(),
            id_cursor: batch.ids().ones(),
        })
    }

    /// Events not yet materialized by this reader.
    pub fn remaining(&self) -> u64 {
        self.available
    }

    /// Decodes the next event from the payload stream.
    ///
    /// Fails with [`StorageError::Exhausted`] once every event has been
    /// materialized. The identifier comes from the batch's bitmap, or
    /// stays [`EventId::INVALID`] when the batch is unlabeled.
    pub fn materialize(&mut self) -> Result<Event> {
        if self.available == 0 {
            return Err(StorageError::Exhausted);
        }
        let mut decoder = Decoder::new(&self.buf[self.pos..]);
        let type_id: u32 = decoder.take()?;
        let idx = type_id as usize;
        if idx == self.dictionary.len() {
            let ty: EventType = decoder.take()?;
            self.dictionary.push(ty);
        } else if idx > self.dictionary.len() {
            return Err(StorageError::UnknownTypeId { id: type_id });
        }
        let timestamp: Timestamp = decoder.take()?;
        let value: Value = decoder.take()?;
        self.pos = self.buf.len() - decoder.remaining();
        self.available -= 1;
        let mut event = Event::new(self.dictionary[idx].clone(), value, timestamp);
        if let Some(id) = self.id_cursor.next() {
            event.set_id(EventId::new(id));
        }
        Ok(event)
    }

    /// Materializes every remaining event, in payload order.
    pub fn read(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::with_capacity(self.available as usize);
        while self.available > 0 {
            events.push(self.materialize()?);
        }
        Ok(events)
    }

    /// Materializes exactly the events whose identifiers are set in
    /// `query`, in identifier order.
    ///
    /// The two identifier streams — the materialization stream, monotone
    /// because the batch's bitmap is, and the query's bit runs — are
    /// merge-joined. An event pulled off the stream while chasing a
    /// wanted id is held as `pending` until it is either emitted or
    /// proven smaller than every remaining target, so no event is
    /// materialized twice. Query bits past the batch's identifier space
    /// terminate the walk: no later target can match.
    pub fn select(&mut self, query: &Bitmap) -> Result<Vec<Event>> {
        let mut result = Vec::new();
        if self.batch.ids().is_empty() {
            return Ok(result);
        }
        let id_space = self.batch.ids().size();
        let mut pending: Option<Event> = None;
        // Bit offset of the current query run; `n + local` is absolute.
        let mut n = 0u64;
        for run in query.runs() {
            let Some(first) = run.find_first() else {
                n += run.size();
                continue;
            };
            let mut target = Some(n + first);
            // A previously materialized event can be ahead of the first
            // wanted id of this run; catch the run up before pulling
            // anything else off the stream.
            let pending_id = pending.as_ref().map(|e| e.id().as_u64());
            if let (Some(pid), Some(t)) = (pending_id, target) {
                if pid > t {
                    target = next_in_run(run, n, pid - 1);
                    if target == Some(pid) {
                        if let Some(event) = pending.take() {
                            result.push(event);
                        }
                        target = next_in_run(run, n, pid);
                    }
                }
            }
            while let Some(t) = target {
                if t >= id_space {
                    return Ok(result);
                }
                // Materialize until the stream catches up with the
                // wanted id.
                let pid = loop {
                    if let Some(event) = &pending {
                        let pid = event.id().as_u64();
                        if pid >= t {
                            break pid;
                        }
                    }
                    match self.materialize() {
                        Ok(event) => pending = Some(event),
                        Err(StorageError::Exhausted) => return Ok(result),
                        Err(err) => return Err(err),
                    }
                };
                if pid > t {
                    // The wanted id is absent from this batch; the next
                    // candidate in this run is at or beyond the pending
                    // event's id.
                    target = next_in_run(run, n, pid - 1);
                }
                if target == Some(pid) {
                    if let Some(event) = pending.take() {
                        result.push(event);
                    }
                    target = next_in_run(run, n, pid);
                }
            }
            n += run.size();
        }
        Ok(result)
    }
}

/// First set bit of `run` strictly after absolute position `k`, as an
/// absolute position. `n` is the run's base offset.
fn next_in_run(run: Bits, n: u64, k: u64) -> Option<u64> {
    run.find_next(k - n).map(|i| n + i)
}
