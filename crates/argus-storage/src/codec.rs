//! Compression filters for batch payloads.
//!
//! The write side is a streaming sink: serialized event records flow into
//! a [`CompressedSink`] as they are written and the compressed bytes
//! accumulate in an owned buffer, surrendered by [`CompressedSink::finish`]
//! when the batch seals. The read side inverts a whole payload at once;
//! both sides must agree byte-for-byte on the uncompressed stream.

use std::io::{Read, Write};

use argus_types::CompressionKind;

use crate::{Result, StorageError};

/// Zstd compression level used for batch payloads (zstd's own default).
const ZSTD_LEVEL: i32 = 3;

/// A streaming compression filter over an owned byte buffer.
pub enum CompressedSink {
    None(Vec<u8>),
    Lz4(Box<lz4_flex::frame::FrameEncoder<Vec<u8>>>),
    Snappy(Box<snap::write::FrameEncoder<Vec<u8>>>),
    Zstd(zstd::stream::Encoder<'static, Vec<u8>>),
}

impl CompressedSink {
    /// Opens a fresh sink for the given codec.
    pub fn new(kind: CompressionKind) -> Result<Self> {
        let sink = match kind {
            CompressionKind::None => CompressedSink::None(Vec::new()),
            CompressionKind::Lz4 => CompressedSink::Lz4(Box::new(
                lz4_flex::frame::FrameEncoder::new(Vec::new()),
            )),
            CompressionKind::Snappy => CompressedSink::Snappy(Box::new(
                snap::write::FrameEncoder::new(Vec::new()),
            )),
            CompressionKind::Zstd => CompressedSink::Zstd(
                zstd::stream::Encoder::new(Vec::new(), ZSTD_LEVEL).map_err(|e| {
                    StorageError::Compression {
                        codec: "zstd",
                        reason: e.to_string(),
                    }
                })?,
            ),
        };
        Ok(sink)
    }

    /// The codec this sink compresses with.
    pub fn kind(&self) -> CompressionKind {
        match self {
            CompressedSink::None(_) => CompressionKind::None,
            CompressedSink::Lz4(_) => CompressionKind::Lz4,
            CompressedSink::Snappy(_) => CompressionKind::Snappy,
            CompressedSink::Zstd(_) => CompressionKind::Zstd,
        }
    }

    /// Feeds bytes through the filter.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let (codec, result) = match self {
            CompressedSink::None(buf) => {
                buf.extend_from_slice(bytes);
                return Ok(());
            }
            CompressedSink::Lz4(encoder) => ("lz4", encoder.write_all(bytes)),
            CompressedSink::Snappy(encoder) => ("snappy", encoder.write_all(bytes)),
            CompressedSink::Zstd(encoder) => ("zstd", encoder.write_all(bytes)),
        };
        result.map_err(|e| StorageError::Compression {
            codec,
            reason: e.to_string(),
        })
    }

    /// Flushes the filter and surrenders the compressed buffer.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self {
            CompressedSink::None(buf) => Ok(buf),
            CompressedSink::Lz4(encoder) => {
                encoder.finish().map_err(|e| StorageError::Compression {
                    codec: "lz4",
                    reason: e.to_string(),
                })
            }
            CompressedSink::Snappy(mut encoder) => {
                encoder.flush().map_err(|e| StorageError::Compression {
                    codec: "snappy",
                    reason: e.to_string(),
                })?;
                encoder
                    .into_inner()
                    .map_err(|e| StorageError::Compression {
                        codec: "snappy",
                        reason: e.into_error().to_string(),
                    })
            }
            CompressedSink::Zstd(encoder) => {
                encoder.finish().map_err(|e| StorageError::Compression {
                    codec: "zstd",
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Inverts a compressed payload, yielding exactly the bytes that were fed
/// to the matching [`CompressedSink`].
pub fn decompress(kind: CompressionKind, payload: &[u8]) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::None => Ok(payload.to_vec()),
        CompressionKind::Lz4 => {
            let mut out = Vec::new();
            lz4_flex::frame::FrameDecoder::new(payload)
                .read_to_end(&mut out)
                .map_err(|e| StorageError::Decompression {
                    codec: "lz4",
                    reason: e.to_string(),
                })?;
            Ok(out)
        }
        CompressionKind::Snappy => {
            let mut out = Vec::new();
            snap::read::FrameDecoder::new(payload)
                .read_to_end(&mut out)
                .map_err(|e| StorageError::Decompression {
                    codec: "snappy",
                    reason: e.to_string(),
                })?;
            Ok(out)
        }
        CompressionKind::Zstd => {
            zstd::decode_all(payload).map_err(|e| StorageError::Decompression {
                codec: "zstd",
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(CompressionKind::None)]
    #[test_case(CompressionKind::Lz4)]
    #[test_case(CompressionKind::Snappy)]
    #[test_case(CompressionKind::Zstd)]
    fn roundtrip(kind: CompressionKind) {
        let mut sink = CompressedSink::new(kind).unwrap();
        assert_eq!(sink.kind(), kind);
        sink.write(b"the quick brown fox ").unwrap();
        sink.write(b"jumps over the lazy dog").unwrap();
        let payload = sink.finish().unwrap();
        let restored = decompress(kind, &payload).unwrap();
        assert_eq!(restored, b"the quick brown fox jumps over the lazy dog");
    }

    #[test_case(CompressionKind::None)]
    #[test_case(CompressionKind::Lz4)]
    #[test_case(CompressionKind::Snappy)]
    #[test_case(CompressionKind::Zstd)]
    fn empty_stream_roundtrips(kind: CompressionKind) {
        let sink = CompressedSink::new(kind).unwrap();
        let payload = sink.finish().unwrap();
        assert_eq!(decompress(kind, &payload).unwrap(), Vec::<u8>::new());
    }

    #[test_case(CompressionKind::Lz4)]
    #[test_case(CompressionKind::Snappy)]
    #[test_case(CompressionKind::Zstd)]
    fn repetitive_data_shrinks(kind: CompressionKind) {
        let mut sink = CompressedSink::new(kind).unwrap();
        sink.write(&[42u8; 10_000]).unwrap();
        let payload = sink.finish().unwrap();
        assert!(payload.len() < 10_000);
    }

    #[test_case(CompressionKind::Lz4)]
    #[test_case(CompressionKind::Snappy)]
    #[test_case(CompressionKind::Zstd)]
    fn garbage_payload_is_rejected(kind: CompressionKind) {
        let garbage = [0xFFu8; 16];
        let result = decompress(kind, &garbage);
        assert!(matches!(
            result,
            Err(StorageError::Decompression { .. })
        ));
    }
}
