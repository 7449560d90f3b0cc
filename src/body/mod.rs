//! Streaming request/response bodies.

#[cfg(feature = "compression")]
pub mod compress;

use std::pin::Pin;

use bytes::{Bytes, BytesMut};

use crate::error::Error;

/// A single-consumer, forward-only producer of bytes.
///
/// `read_some` never returns more bytes than `buf` can hold, signals end of
/// stream with `Ok(0)`, and treats any error as terminal: callers must not
/// call it again after an error.
#[async_trait::async_trait]
pub trait AsyncBody: Send + Unpin {
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// A hint for the total remaining byte count, when known up front.
    /// Used by the connection writer to choose `Content-Length` over
    /// chunked framing.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// A type-erased body, boxed so `Request`/`Response` can hold any shape
/// uniformly.
pub type BoxBody = Pin<Box<dyn AsyncBody>>;

/// An empty body: the common case for GET requests and bodiless responses.
pub struct EofBody;

#[async_trait::async_trait]
impl AsyncBody for EofBody {
    async fn read_some(&mut self, _buf: &mut [u8]) -> Result<usize, Error> {
        Ok(0)
    }

    fn size_hint(&self) -> Option<u64> {
        Some(0)
    }
}

/// A body whose full contents are already resident in memory.
pub struct MemoryBody {
    data: Bytes,
    pos: usize,
}

impl MemoryBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        MemoryBody {
            data: data.into(),
            pos: 0,
        }
    }
}

#[async_trait::async_trait]
impl AsyncBody for MemoryBody {
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            return Ok(0);
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn size_hint(&self) -> Option<u64> {
        Some((self.data.len() - self.pos) as u64)
    }
}

/// A body of unknown total size, fed incrementally (e.g. by the chunked
/// transfer-coding decoder reading from the socket).
pub struct ChunkedBody {
    receiver: tokio::sync::mpsc::Receiver<Result<Bytes, Error>>,
    current: BytesMut,
}

impl ChunkedBody {
    pub fn new(receiver: tokio::sync::mpsc::Receiver<Result<Bytes, Error>>) -> Self {
        ChunkedBody {
            receiver,
            current: BytesMut::new(),
        }
    }
}

#[async_trait::async_trait]
impl AsyncBody for ChunkedBody {
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.current.is_empty() {
            match self.receiver.recv().await {
                None => return Ok(0),
                Some(Err(e)) => return Err(e),
                Some(Ok(bytes)) => self.current = BytesMut::from(&bytes[..]),
            }
        }
        let n = self.current.len().min(buf.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        let _ = self.current.split_to(n);
        Ok(n)
    }
}

/// Read an entire body into memory, respecting `limit` bytes.
pub async fn read_to_end(body: &mut dyn AsyncBody, limit: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = body.read_some(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if out.len() + n > limit {
            return Err(Error::Config(format!(
                "body exceeds configured limit of {limit} bytes"
            )));
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_body_reads_in_chunks() {
        let mut body = MemoryBody::new(&b"hello world"[..]);
        let mut buf = [0u8; 4];
        let n1 = body.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n1], b"hell");
        let rest = read_to_end(&mut body, 1024).await.unwrap();
        assert_eq!(rest, b"o world");
    }

    #[tokio::test]
    async fn eof_body_reads_zero_immediately() {
        let mut body = EofBody;
        let mut buf = [0u8; 4];
        assert_eq!(body.read_some(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_to_end_enforces_limit() {
        let mut body = MemoryBody::new(&b"0123456789"[..]);
        let err = read_to_end(&mut body, 4).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
