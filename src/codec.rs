use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DemuxError, Result};
use crate::stream::StreamKind;

/// Frame header: tag (1) + padding (3) + big-endian length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Maximum declared payload length: 64 KiB, inclusive.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Decode-buffer capacity at construction, before any growth.
pub const DEFAULT_INITIAL_CAPACITY: usize = 2048;

/// A validated frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// The stream the payload belongs to.
    pub stream: StreamKind,
    /// Declared payload length in bytes.
    pub length: u32,
}

/// A complete demultiplexed frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The stream this payload belongs to.
    pub stream: StreamKind,
    /// The payload, opaque bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(stream: StreamKind, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Decode and validate an 8-byte frame header.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬─────────────────┬────────────────┐
/// │ Tag (1B) │ Pad (3B)  │ Length (4B BE)  │ Payload        │
/// │ 0/1/2    │ ignored   │ unsigned        │ Length bytes   │
/// └──────────┴───────────┴─────────────────┴────────────────┘
/// ```
///
/// The padding bytes are read and discarded without validation; only the tag
/// byte and the declared length can reject a header. Rejecting an oversized
/// length here, before any body byte is requested, keeps a corrupted length
/// field from forcing a large read or allocation.
pub fn decode_header(bytes: &[u8; HEADER_SIZE], max_frame_size: usize) -> Result<FrameHeader> {
    let stream =
        StreamKind::from_byte(bytes[0]).ok_or(DemuxError::UnknownStreamTag(bytes[0]))?;

    let length = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    if length as usize > max_frame_size {
        return Err(DemuxError::FrameTooLarge {
            size: length as usize,
            max: max_frame_size,
        });
    }

    Ok(FrameHeader { stream, length })
}

/// Encode one frame into the wire format.
///
/// The loopback counterpart of the decoder, used by fixtures and round-trip
/// tests; there is no streaming writer type.
pub fn encode_frame(stream: StreamKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(DemuxError::FrameTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(stream.as_byte());
    dst.put_bytes(0, 3);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for the demultiplexer.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Maximum declared payload length accepted. Default: 64 KiB.
    pub max_frame_size: usize,
    /// Decode-buffer capacity at construction. Default: 2 KiB.
    pub initial_buffer_capacity: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            initial_buffer_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}
