use std::io;

/// Errors that can occur while demultiplexing a log stream.
///
/// Every variant is terminal for the reader that produced it; frame
/// boundaries are lost on the first malformed byte, so there is no
/// resynchronization. Callers branch on the variant, not the message.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    /// The stream ended partway through an 8-byte frame header.
    #[error("corrupted frame header (read {read} of 8 bytes)")]
    CorruptHeader { read: usize },

    /// Upstream failed while the frame header was being read.
    #[error("failed to read frame header: {source}")]
    HeaderRead { source: io::Error },

    /// The header's tag byte is outside the recognized stream set.
    #[error("unexpected stream tag byte: {0:#x}")]
    UnknownStreamTag(u8),

    /// The declared payload length exceeds the configured maximum.
    #[error("frame payload too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The stream ended or faulted before the declared payload length was
    /// satisfied. `source` carries the underlying cause.
    #[error("corrupt frame body (read {read} of {expected} bytes): {source}")]
    TruncatedBody {
        read: usize,
        expected: usize,
        source: io::Error,
    },

    /// Upstream failed before yielding any payload byte.
    #[error("failed to read frame body: {source}")]
    BodyRead { source: io::Error },

    /// A transport error surfaced through the incremental codec path.
    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DemuxError>;

// Terminal errors are replayed on every pull after the first failure, so the
// stored error must be reproducible. `io::Error` does not implement `Clone`;
// sources are rebuilt from kind + rendered message, which keeps both the
// branchable kind and the message text stable across replays.
impl Clone for DemuxError {
    fn clone(&self) -> Self {
        match self {
            DemuxError::CorruptHeader { read } => DemuxError::CorruptHeader { read: *read },
            DemuxError::HeaderRead { source } => DemuxError::HeaderRead {
                source: clone_io(source),
            },
            DemuxError::UnknownStreamTag(byte) => DemuxError::UnknownStreamTag(*byte),
            DemuxError::FrameTooLarge { size, max } => DemuxError::FrameTooLarge {
                size: *size,
                max: *max,
            },
            DemuxError::TruncatedBody {
                read,
                expected,
                source,
            } => DemuxError::TruncatedBody {
                read: *read,
                expected: *expected,
                source: clone_io(source),
            },
            DemuxError::BodyRead { source } => DemuxError::BodyRead {
                source: clone_io(source),
            },
            DemuxError::Io(source) => DemuxError::Io(clone_io(source)),
        }
    }
}

fn clone_io(err: &io::Error) -> io::Error {
    io::Error::new(err.kind(), err.to_string())
}

impl From<DemuxError> for io::Error {
    fn from(err: DemuxError) -> Self {
        let kind = match &err {
            DemuxError::CorruptHeader { .. }
            | DemuxError::UnknownStreamTag(_)
            | DemuxError::FrameTooLarge { .. } => io::ErrorKind::InvalidData,
            DemuxError::TruncatedBody { .. } => io::ErrorKind::UnexpectedEof,
            DemuxError::HeaderRead { source }
            | DemuxError::BodyRead { source }
            | DemuxError::Io(source) => source.kind(),
        };
        io::Error::new(kind, err)
    }
}
