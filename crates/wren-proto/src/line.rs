//! Line codec: the framing layer between the byte stream and messages.
//!
//! One transport read may carry several CRLF-terminated commands
//! back-to-back; `decode` yields them one at a time, in order. A partial
//! trailing command stays buffered until more bytes arrive, and at end of
//! stream `decode_eof` surfaces the unterminated remainder so no trailing
//! data is lost. Lines are capped at 512 bytes per the IRC convention.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::MESSAGE_MAX_LEN;

/// Codec that frames newline-terminated IRC lines.
pub struct LineCodec {
    /// Index of the next byte to check for a newline.
    next_index: usize,
    /// Maximum line length, terminator included.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the standard 512 byte line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MESSAGE_MAX_LEN,
        }
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn to_line(&self, bytes: &[u8]) -> error::Result<String> {
        let s = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(s.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            Ok(Some(self.to_line(&line)?))
        } else {
            // No complete line yet; remember where the scan stopped.
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Unterminated trailing command: treat the remaining buffer
                // as the whole final line.
                let rest = src.split_to(src.len());
                self.next_index = 0;
                Ok(Some(self.to_line(&rest)?))
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend(msg.into_bytes());
        Ok(())
    }
}
