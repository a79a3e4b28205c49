//! Wire glue between the batch layer and its serializer.
//!
//! Postcard is the value codec: every encoding is self-delimiting, so
//! event records can be concatenated on the uncompressed stream and taken
//! back off the front one value at a time. Integer type ids ride the same
//! varint encoding as everything else.

use serde::{Deserialize, Serialize};

use crate::codec::CompressedSink;
use crate::{Result, StorageError};

/// Serializes one value and feeds it through the compression filter.
pub fn emit<T: Serialize>(sink: &mut CompressedSink, value: &T) -> Result<()> {
    let bytes = postcard::to_allocvec(value).map_err(|e| StorageError::Encode {
        reason: e.to_string(),
    })?;
    sink.write(&bytes)
}

/// Takes values off the front of a decompressed payload.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Deserializes the next value, consuming its bytes.
    pub fn take<T: Deserialize<'a>>(&mut self) -> Result<T> {
        let (value, rest) = postcard::take_from_bytes(self.buf).map_err(|e| match e {
            postcard::Error::DeserializeUnexpectedEnd => StorageError::UnexpectedEof,
            other => StorageError::Decode {
                reason: other.to_string(),
            },
        })?;
        self.buf = rest;
        Ok(value)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}
