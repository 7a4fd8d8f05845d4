//! Stream tags carried in frame headers.
//!
//! The transport interleaves three well-known process streams over a single
//! connection. The tag byte is the first byte of every frame header; any
//! other value means the stream is corrupt or misaligned, so the set is a
//! closed enum rather than an open integer.

/// The process stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamKind {
    /// Input fed to the remote process. Rare in log streams, legal on the wire.
    Stdin = 0,
    /// The remote process's standard output.
    Stdout = 1,
    /// The remote process's standard error.
    Stderr = 2,
}

impl StreamKind {
    /// Map a header tag byte to a stream, or `None` for unrecognized values.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(StreamKind::Stdin),
            1 => Some(StreamKind::Stdout),
            2 => Some(StreamKind::Stderr),
            _ => None,
        }
    }

    /// The tag byte written on the wire for this stream.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for the stream.
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Stdin => "stdin",
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_mapping_round_trips() {
        for kind in [StreamKind::Stdin, StreamKind::Stdout, StreamKind::Stderr] {
            assert_eq!(StreamKind::from_byte(kind.as_byte()), Some(kind));
        }
    }

    #[test]
    fn unrecognized_bytes_rejected() {
        for byte in [3u8, 4, 0x7f, 0xff] {
            assert_eq!(StreamKind::from_byte(byte), None);
        }
    }

    #[test]
    fn names() {
        assert_eq!(StreamKind::Stdin.name(), "stdin");
        assert_eq!(StreamKind::Stdout.name(), "stdout");
        assert_eq!(StreamKind::Stderr.name(), "stderr");
    }
}
