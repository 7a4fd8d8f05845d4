//! Streaming demultiplexer for tag-prefixed multiplexed log transports.
//!
//! Container runtimes that interleave a process's stdin/stdout/stderr over a
//! single connection prefix every chunk with a fixed 8-byte header:
//!
//! ```text
//! ┌──────────┬───────────┬─────────────────┬────────────────┐
//! │ Tag (1B) │ Pad (3B)  │ Length (4B BE)  │ Payload        │
//! │ 0/1/2    │ ignored   │ unsigned        │ Length bytes   │
//! └──────────┴───────────┴─────────────────┴────────────────┘
//! ```
//!
//! [`DemuxReader`] strips that framing back off, validating every header and
//! exposing the payload bytes of consecutive frames as one continuous
//! [`std::io::Read`] stream — no whole-stream buffering, one frame decoded at
//! a time.
//!
//! ```
//! use std::io::Read;
//!
//! use bytes::BytesMut;
//! use logdemux::{encode_frame, DemuxReader, StreamKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut wire = BytesMut::new();
//! encode_frame(StreamKind::Stdout, b"hello\n", &mut wire)?;
//! encode_frame(StreamKind::Stderr, b"world\n", &mut wire)?;
//!
//! let mut out = String::new();
//! DemuxReader::new(&wire[..]).read_to_string(&mut out)?;
//! assert_eq!(out, "hello\nworld\n");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod reader;
pub mod stream;

#[cfg(feature = "async")]
pub mod framed;

pub use codec::{
    decode_header, encode_frame, DemuxConfig, Frame, FrameHeader, HEADER_SIZE, MAX_FRAME_SIZE,
};
pub use error::{DemuxError, Result};
pub use reader::DemuxReader;
pub use stream::StreamKind;

#[cfg(feature = "async")]
pub use framed::FrameDecoder;
