//! DEFLATE driver: streaming inflate over the stored payload.
//!
//! The compressed stream is forward-only. Forward seeks discard decoded
//! bytes; a backward seek resets the inflate state and re-consumes from
//! the start of the payload. `real_sz` from the entry record is the
//! end-of-stream sentinel: a payload that runs dry earlier is logged and
//! surfaced as end-of-stream, not as an error.

use std::io::SeekFrom;

use flate2::{Decompress, FlushDecompress, Status};

use super::resolve_seek;
use crate::error::{RelicError, Result};

const DISCARD_CHUNK: usize = 512;

pub(crate) struct DeflateDecoder<'a> {
    input: &'a [u8],
    real_sz: u64,
    inflate: Decompress,
    /// Consumed prefix of `input`
    in_pos: usize,
    /// Logical decoded position
    out_pos: u64,
    /// Stream ended (normally or short); further reads return 0
    done: bool,
}

impl<'a> DeflateDecoder<'a> {
    pub(crate) fn new(input: &'a [u8], real_sz: u32) -> Self {
        DeflateDecoder {
            input,
            real_sz: real_sz as u64,
            // Raw DEFLATE, no zlib wrapper.
            inflate: Decompress::new(false),
            in_pos: 0,
            out_pos: 0,
            done: false,
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.done || self.out_pos >= self.real_sz {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(self.real_sz - self.out_pos) as usize;
        let mut produced = 0usize;

        while produced < want {
            let before_in = self.inflate.total_in();
            let before_out = self.inflate.total_out();
            let status = self
                .inflate
                .decompress(
                    &self.input[self.in_pos..],
                    &mut buf[produced..want],
                    FlushDecompress::None,
                )
                .map_err(|e| RelicError::CorruptStream(e.to_string()))?;

            let consumed = (self.inflate.total_in() - before_in) as usize;
            let wrote = (self.inflate.total_out() - before_out) as usize;
            self.in_pos += consumed;
            self.out_pos += wrote as u64;
            produced += wrote;

            match status {
                Status::StreamEnd => {
                    self.done = true;
                    if self.out_pos < self.real_sz {
                        tracing::warn!(
                            decoded = self.out_pos,
                            expected = self.real_sz,
                            "deflate stream ended short"
                        );
                    }
                    break;
                }
                Status::Ok | Status::BufError => {
                    if consumed == 0 && wrote == 0 {
                        // Input exhausted before the stream terminator.
                        self.done = true;
                        tracing::warn!(
                            decoded = self.out_pos,
                            expected = self.real_sz,
                            "deflate payload exhausted short"
                        );
                        break;
                    }
                }
            }
        }

        Ok(produced)
    }

    pub(crate) fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = resolve_seek(pos, self.out_pos, self.real_sz);

        if target < self.out_pos {
            self.inflate.reset(false);
            self.in_pos = 0;
            self.out_pos = 0;
            self.done = false;
        }

        let mut scratch = [0u8; DISCARD_CHUNK];
        while self.out_pos < target {
            let step = ((target - self.out_pos) as usize).min(DISCARD_CHUNK);
            if self.read(&mut scratch[..step])? == 0 {
                break;
            }
        }

        Ok(self.out_pos)
    }

    pub(crate) fn tell(&self) -> u64 {
        self.out_pos
    }
}
