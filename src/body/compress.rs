//! DEFLATE/gzip body adapters, built on `flate2`'s streaming `Compress`
//! and `Decompress` state machines so a single segment of output can be
//! produced without buffering the whole body.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use super::AsyncBody;
use crate::error::Error;

const SCRATCH: usize = 8192;

enum Direction {
    Compress(Compress),
    Decompress(Decompress),
}

/// Wraps a source body, transforming it with a DEFLATE/gzip codec as it is
/// read. Advances the underlying state machine until at least one output
/// byte is produced or the source reports end of stream.
pub struct CodecBody<B> {
    inner: B,
    direction: Direction,
    scratch: Vec<u8>,
    scratch_len: usize,
    source_eof: bool,
}

impl<B: AsyncBody> CodecBody<B> {
    pub fn deflate(inner: B, level: Compression) -> Self {
        CodecBody {
            inner,
            direction: Direction::Compress(Compress::new(level, false)),
            scratch: vec![0; SCRATCH],
            scratch_len: 0,
            source_eof: false,
        }
    }

    pub fn gzip(inner: B, level: Compression) -> Self {
        CodecBody {
            inner,
            direction: Direction::Compress(Compress::new(level, true)),
            scratch: vec![0; SCRATCH],
            scratch_len: 0,
            source_eof: false,
        }
    }

    pub fn inflate(inner: B) -> Self {
        CodecBody {
            inner,
            direction: Direction::Decompress(Decompress::new(false)),
            scratch: vec![0; SCRATCH],
            scratch_len: 0,
            source_eof: false,
        }
    }

    pub fn gunzip(inner: B) -> Self {
        CodecBody {
            inner,
            direction: Direction::Decompress(Decompress::new(true)),
            scratch: vec![0; SCRATCH],
            scratch_len: 0,
            source_eof: false,
        }
    }

    async fn fill_scratch(&mut self) -> Result<(), Error> {
        if self.scratch_len == 0 && !self.source_eof {
            let n = self.inner.read_some(&mut self.scratch).await?;
            if n == 0 {
                self.source_eof = true;
            } else {
                self.scratch_len = n;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<B: AsyncBody> AsyncBody for CodecBody<B> {
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        loop {
            self.fill_scratch().await?;
            let input = &self.scratch[..self.scratch_len];
            let flush = if self.source_eof {
                true
            } else {
                false
            };

            let (consumed, produced, done) = match &mut self.direction {
                Direction::Compress(c) => {
                    let before_in = c.total_in();
                    let before_out = c.total_out();
                    let mode = if flush {
                        FlushCompress::Finish
                    } else {
                        FlushCompress::None
                    };
                    let status = c
                        .compress(input, buf, mode)
                        .map_err(|e| Error::Config(format!("compress error: {e}")))?;
                    let consumed = (c.total_in() - before_in) as usize;
                    let produced = (c.total_out() - before_out) as usize;
                    (consumed, produced, status == Status::StreamEnd)
                }
                Direction::Decompress(d) => {
                    let before_in = d.total_in();
                    let before_out = d.total_out();
                    let mode = if flush {
                        FlushDecompress::Finish
                    } else {
                        FlushDecompress::None
                    };
                    let status = d
                        .decompress(input, buf, mode)
                        .map_err(|e| Error::Config(format!("decompress error: {e}")))?;
                    let consumed = (d.total_in() - before_in) as usize;
                    let produced = (d.total_out() - before_out) as usize;
                    (consumed, produced, status == Status::StreamEnd)
                }
            };

            if consumed > 0 {
                self.scratch.copy_within(consumed..self.scratch_len, 0);
                self.scratch_len -= consumed;
            }

            if produced > 0 {
                return Ok(produced);
            }
            if done || (self.source_eof && self.scratch_len == 0) {
                return Ok(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{read_to_end, MemoryBody};

    #[tokio::test]
    async fn gzip_round_trips() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed_body = CodecBody::gzip(
            MemoryBody::new(original.clone()),
            Compression::default(),
        );
        let mut compressed_body = compressed_body;
        let compressed = read_to_end(&mut compressed_body, 1 << 20).await.unwrap();
        assert_ne!(compressed, original);

        let mut decoded_body = CodecBody::gunzip(MemoryBody::new(compressed));
        let decoded = read_to_end(&mut decoded_body, 1 << 20).await.unwrap();
        assert_eq!(decoded, original);
    }
}
