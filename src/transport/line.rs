//! CRLF line codec for tokio.

use std::borrow::Cow;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use super::TransportError;

/// Largest accepted inbound line: 4096 bytes of tags plus a 512-byte
/// message, rounded up to the IRCv3 limit.
pub const MAX_IRC_LINE_LEN: usize = 8191;

/// Whether `ch` is an IRC formatting code or the CTCP delimiter.
fn is_irc_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x01' | '\x02' | '\x03' | '\x04' | '\x0f' | '\x11' | '\x16' | '\x1d' | '\x1e' | '\x1f'
    )
}

/// Control characters that never appear in IRC text.
///
/// NUL is left to the line parser, which reports it with an offset.
fn is_illegal_control_char(ch: char) -> bool {
    ch.is_control()
        && !matches!(ch, '\r' | '\n' | '\0' | '\t')
        && !is_irc_format_code(ch)
}

/// Log stray control characters in inbound text. The text is still
/// delivered; whether the line is usable is for the parser to decide.
pub(crate) fn inspect_line(s: &str) {
    if let Some(ch) = s.chars().find(|ch| is_illegal_control_char(*ch)) {
        warn!(?ch, "inbound line carries a stray control character");
    }
}

/// Line-based codec that handles newline-terminated messages.
///
/// Decoded lines have their CRLF removed. Encoding appends CRLF.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// A codec accepting lines up to [`MAX_IRC_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(MAX_IRC_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, TransportError> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(TransportError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            // Only the length is fatal here.
            let data = String::from_utf8_lossy(&line);
            if let Cow::Owned(_) = data {
                warn!(len = line.len(), "inbound line is not UTF-8; invalid bytes replaced");
            }
            let data = data.trim_end_matches(['\r', '\n']);
            inspect_line(data);

            Ok(Some(data.to_owned()))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(TransportError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = TransportError;

    fn encode(&mut self, line: &'a str, dst: &mut BytesMut) -> Result<(), TransportError> {
        let line = line.trim_end_matches(['\r', '\n']);
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"rest\r\nPONG");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :rest".to_string()));
        assert_eq!(&buf[..], b"PONG");
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\n");

        assert!(matches!(
            codec.decode(&mut buf),
            Err(TransportError::LineTooLong { limit: 10, .. })
        ));
    }

    #[test]
    fn test_decode_control_chars_pass_through() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PRIVMSG #a :\x01ACTION \x02bold\x02\x01\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());

        let mut buf = BytesMut::from("PRIVMSG #a :ding\x07\r\nPING :after\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PRIVMSG #a :ding\x07".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :after".to_string()));
    }

    #[test]
    fn test_decode_invalid_utf8_replaced() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :caf\xe9\r\nPING :after\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PRIVMSG #a :caf\u{FFFD}".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :after".to_string()));
    }

    #[test]
    fn test_illegal_control_chars() {
        assert!(is_illegal_control_char('\x07'));
        assert!(is_illegal_control_char('\x05'));
        assert!(!is_illegal_control_char('\x01'));
        assert!(!is_illegal_control_char('\t'));
        assert!(!is_illegal_control_char('\0'));
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG :test", &mut buf).unwrap();
        codec.encode("NICK n\r\n", &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\nNICK n\r\n");
    }
}
