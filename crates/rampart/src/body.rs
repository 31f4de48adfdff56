//! Buffered request/response bodies that can be read multiple times.
//!
//! The standard HTTP stacks buffer as little as possible, which makes a
//! rejected request impossible to replay. Buffering the entity exactly once
//! lets the authentication retry path resend a byte-identical body.

use std::fmt;
use std::io;

use bytes::Bytes;

/// A rewindable byte buffer with no-op close semantics.
///
/// The zero value behaves like an empty reader. The underlying bytes are
/// reference-counted, so cloning a body is cheap and the data is never
/// copied on replay.
#[derive(Debug, Clone, Default)]
pub struct Body {
    data: Bytes,
    pos:  usize,
}

impl Body {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Body { data: data.into(), pos: 0 }
    }

    pub fn empty() -> Self {
        Body::default()
    }

    /// The full byte slice regardless of the current read position.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reset the read position to the start so the body can be sent again.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Closing a buffered body releases nothing; the contract exists so the
    /// request engine can treat any body uniformly.
    pub fn close(&mut self) {}
}

impl io::Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::new(s.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::new(s.into_bytes())
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::new(v)
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::new(b)
    }
}
