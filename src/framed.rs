//! Incremental frame decoding for async byte streams.
//!
//! [`FrameDecoder`] implements [`tokio_util::codec::Decoder`], so the same
//! wire format can be consumed through `FramedRead` instead of the blocking
//! [`DemuxReader`](crate::DemuxReader). Items are whole [`Frame`]s with their
//! stream tag attached; concatenating payloads is left to the caller.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::{decode_header, Frame, HEADER_SIZE, MAX_FRAME_SIZE};
use crate::error::DemuxError;

/// Incremental decoder yielding one [`Frame`] per wire frame.
///
/// Headers are validated as soon as 8 bytes are buffered; an oversized
/// declared length is rejected before the body is awaited.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Create a decoder with the default 64 KiB frame size limit.
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Create a decoder with an explicit frame size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = DemuxError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, DemuxError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let header: [u8; HEADER_SIZE] = src[..HEADER_SIZE].try_into().unwrap();
        let header = decode_header(&header, self.max_frame_size)?;

        let total = HEADER_SIZE + header.length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(header.length as usize).freeze();
        trace!(
            stream = header.stream.name(),
            length = header.length,
            "decoded frame"
        );
        Ok(Some(Frame {
            stream: header.stream,
            payload,
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, DemuxError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        if src.len() < HEADER_SIZE {
            return Err(DemuxError::CorruptHeader { read: src.len() });
        }

        // Header was valid (decode would have rejected it) but the body is
        // short; report the same counts as the blocking reader.
        let header: [u8; HEADER_SIZE] = src[..HEADER_SIZE].try_into().unwrap();
        let header = decode_header(&header, self.max_frame_size)?;
        Err(DemuxError::TruncatedBody {
            read: src.len() - HEADER_SIZE,
            expected: header.length as usize,
            source: std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "unexpected end of stream",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::encode_frame;
    use crate::stream::StreamKind;

    fn wire(frames: &[(StreamKind, &[u8])]) -> BytesMut {
        let mut out = BytesMut::new();
        for (stream, payload) in frames {
            encode_frame(*stream, payload, &mut out).unwrap();
        }
        out
    }

    #[test]
    fn incomplete_header_waits_for_more() {
        let mut src = BytesMut::from(&[0x01, 0x00, 0x00][..]);
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn incomplete_body_waits_for_more() {
        let mut src = wire(&[(StreamKind::Stdout, b"hello")]);
        src.truncate(HEADER_SIZE + 2);
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn consecutive_frames_decode_in_order() {
        let mut src = wire(&[
            (StreamKind::Stdout, b"one"),
            (StreamKind::Stderr, b"two"),
        ]);
        let mut decoder = FrameDecoder::new();

        let f1 = decoder.decode(&mut src).unwrap().unwrap();
        let f2 = decoder.decode(&mut src).unwrap().unwrap();
        assert_eq!((f1.stream, f1.payload.as_ref()), (StreamKind::Stdout, b"one".as_ref()));
        assert_eq!((f2.stream, f2.payload.as_ref()), (StreamKind::Stderr, b"two".as_ref()));
        assert!(decoder.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());
    }

    #[test]
    fn oversized_length_rejected_before_body_arrives() {
        let mut src = BytesMut::from(&[0x01, 0, 0, 0, 0x00, 0x01, 0x00, 0x01][..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::FrameTooLarge {
                size: 65537,
                max: 65536,
            }
        ));
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut src = BytesMut::from(&[0x03, 0, 0, 0, 0, 0, 0, 0][..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(err, DemuxError::UnknownStreamTag(0x03)));
    }

    #[test]
    fn eof_on_frame_boundary_is_clean() {
        let mut src = wire(&[(StreamKind::Stdout, b"bye")]);
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode_eof(&mut src).unwrap().is_some());
        assert!(decoder.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn eof_mid_header_reports_byte_count() {
        let mut src = BytesMut::from(&[0x01, 0x00, 0x00, 0x00][..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode_eof(&mut src).unwrap_err();
        assert!(matches!(err, DemuxError::CorruptHeader { read: 4 }));
    }

    #[test]
    fn eof_mid_body_reports_counts() {
        let mut src = wire(&[(StreamKind::Stdout, b"helloworld")]);
        src.truncate(HEADER_SIZE + 9);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode_eof(&mut src).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::TruncatedBody {
                read: 9,
                expected: 10,
                ..
            }
        ));
    }

    #[test]
    fn empty_payload_frame_decodes() {
        let mut src = wire(&[(StreamKind::Stdout, b"")]);
        let mut decoder = FrameDecoder::new();
        let frame = decoder.decode(&mut src).unwrap().unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn configured_limit_enforced() {
        let mut src = wire(&[(StreamKind::Stdout, b"seventeen bytes!!")]);
        let mut decoder = FrameDecoder::with_max_frame_size(16);
        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(err, DemuxError::FrameTooLarge { size: 17, max: 16 }));
    }

    #[tokio::test]
    async fn frames_over_framed_read() {
        let src = wire(&[
            (StreamKind::Stdout, b"hello\n"),
            (StreamKind::Stderr, b"world\n"),
        ]);

        let mut framed = FramedRead::new(&src[..], FrameDecoder::new());
        let f1 = framed.next().await.unwrap().unwrap();
        let f2 = framed.next().await.unwrap().unwrap();
        assert_eq!(f1.payload.as_ref(), b"hello\n");
        assert_eq!(f2.payload.as_ref(), b"world\n");
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_surfaces_truncation() {
        let mut src = wire(&[(StreamKind::Stdout, b"cut short")]);
        src.truncate(HEADER_SIZE + 3);

        let mut framed = FramedRead::new(&src[..], FrameDecoder::new());
        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            DemuxError::TruncatedBody {
                read: 3,
                expected: 9,
                ..
            }
        ));
    }
}
