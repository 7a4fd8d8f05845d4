use std::io::{self, ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_header, DemuxConfig, FrameHeader, HEADER_SIZE};
use crate::error::{DemuxError, Result};

/// Pull-based demultiplexing reader over any raw byte source.
///
/// Strips the frame headers back off a multiplexed log stream and yields the
/// payload bytes of consecutive frames as one continuous sequence. Implements
/// [`std::io::Read`], so it slots in front of buffered readers, line
/// scanners, and `io::copy` unchanged.
///
/// One frame is decoded at a time; a frame larger than the caller's buffer is
/// delivered across as many pulls as it takes. The first decode or I/O
/// failure is terminal and replayed on every later pull. Bytes handed out
/// before the failure stay delivered.
pub struct DemuxReader<R> {
    inner: R,
    buf: BytesMut,
    pos: usize,
    state: State,
    config: DemuxConfig,
}

enum State {
    /// Draining the current frame or awaiting the next header.
    Running,
    /// Upstream ended cleanly on a frame boundary.
    Eof,
    /// Terminal failure, replayed on every later pull.
    Failed(DemuxError),
}

impl<R: Read> DemuxReader<R> {
    /// Create a demultiplexing reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, DemuxConfig::default())
    }

    /// Create a demultiplexing reader with explicit configuration.
    pub fn with_config(inner: R, config: DemuxConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.initial_buffer_capacity),
            pos: 0,
            state: State::Running,
            config,
        }
    }

    /// Pull demultiplexed payload bytes into `dst` (blocking).
    ///
    /// Returns the number of bytes copied. `Ok(0)` on a non-empty `dst`
    /// means upstream ended cleanly on a frame boundary; an empty `dst`
    /// returns `Ok(0)` without touching upstream.
    pub fn pull(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }

        loop {
            match &self.state {
                State::Eof => return Ok(0),
                State::Failed(err) => return Err(err.clone()),
                State::Running => {}
            }

            if self.pos < self.buf.len() {
                let n = dst.len().min(self.buf.len() - self.pos);
                dst[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }

            if let Err(err) = self.next_frame() {
                self.state = State::Failed(err.clone());
                return Err(err);
            }
        }
    }

    /// Read and validate one frame from upstream into the decode buffer.
    ///
    /// On clean end-of-stream at a frame boundary, flips the state to `Eof`
    /// and returns `Ok`. Empty-payload frames leave the buffer drained, so
    /// the pull loop simply moves on to the next header.
    fn next_frame(&mut self) -> Result<()> {
        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.inner, &mut header) {
            (_, Outcome::Filled) => {}
            (0, Outcome::Eof) => {
                self.state = State::Eof;
                return Ok(());
            }
            (read, Outcome::Eof) => return Err(DemuxError::CorruptHeader { read }),
            (_, Outcome::Failed(source)) => return Err(DemuxError::HeaderRead { source }),
        }

        let FrameHeader { stream, length } = decode_header(&header, self.config.max_frame_size)?;
        trace!(stream = stream.name(), length, "decoded frame header");

        let length = length as usize;
        self.buf.clear();
        self.buf.resize(length, 0);
        self.pos = 0;

        match read_full(&mut self.inner, &mut self.buf) {
            (_, Outcome::Filled) => Ok(()),
            (0, Outcome::Failed(source)) => Err(DemuxError::BodyRead { source }),
            (read, Outcome::Failed(source)) => Err(DemuxError::TruncatedBody {
                read,
                expected: length,
                source,
            }),
            (read, Outcome::Eof) => {
                let cause = if read == 0 {
                    "end of stream"
                } else {
                    "unexpected end of stream"
                };
                Err(DemuxError::TruncatedBody {
                    read,
                    expected: length,
                    source: io::Error::new(ErrorKind::UnexpectedEof, cause),
                })
            }
        }
    }

    /// Borrow the underlying byte source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying byte source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Update the maximum frame size for subsequent headers.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }
}

impl<R: Read> Read for DemuxReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.pull(buf).map_err(Into::into)
    }
}

enum Outcome {
    Filled,
    Eof,
    Failed(io::Error),
}

/// Read until `buf` is full, tolerating short reads and retrying
/// `ErrorKind::Interrupted`. Reports how many bytes landed alongside the
/// terminating condition.
fn read_full<R: Read>(inner: &mut R, buf: &mut [u8]) -> (usize, Outcome) {
    let mut filled = 0;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => return (filled, Outcome::Eof),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return (filled, Outcome::Failed(err)),
        }
    }
    (filled, Outcome::Filled)
}
