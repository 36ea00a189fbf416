//! CRLF line framing over a byte stream.
//!
//! The transport owns framing; parsing into [`Message`](crate::Message)
//! happens one layer up so a malformed line can be dropped without
//! disturbing the stream.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Maximum inbound line length. RFC 2812 says 512 bytes; servers with
/// message-tags enabled can send up to 8191.
pub const MAX_LINE_LEN: usize = 8191;

/// Frames `\r\n`-terminated lines (tolerating bare `\n`), yielding owned
/// `String`s and writing outbound lines with CRLF appended.
#[derive(Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        let Some(pos) = src.iter().position(|&b| b == b'\n') else {
            if src.len() > MAX_LINE_LEN {
                return Err(CodecError::LineTooLong(src.len()));
            }
            return Ok(None);
        };

        let line_bytes = src.split_to(pos);
        src.advance(1); // the \n
        let line = std::str::from_utf8(&line_bytes)
            .map_err(|_| CodecError::InvalidUtf8)?
            .trim_end_matches('\r');
        Ok(Some(line.to_string()))
    }
}

impl Encoder<String> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), CodecError> {
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_line() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("NICK bob\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "NICK bob");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_partial_then_complete() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("NICK b");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"ob\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "NICK bob");
    }

    #[test]
    fn decode_two_lines_in_one_read() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("NICK bob\r\nUSER bob 0 * :Bob\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "NICK bob");
        assert_eq!(
            codec.decode(&mut buf).unwrap().unwrap(),
            "USER bob 0 * :Bob"
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_bare_newline() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from("PING :x\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "PING :x");
    }

    #[test]
    fn decode_rejects_oversized_line() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(vec![b'A'; MAX_LINE_LEN + 1].as_slice());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::LineTooLong(_))
        ));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::from(&[0xff, 0xfe, b'\r', b'\n'][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::InvalidUtf8)
        ));
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = LineCodec;
        let mut buf = BytesMut::new();
        codec.encode("QUIT :bye".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"QUIT :bye\r\n");
    }
}
