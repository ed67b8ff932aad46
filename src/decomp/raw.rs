//! Raw driver: a cursor over the stored bytes, no decoding.

use std::io::SeekFrom;

use super::resolve_seek;

/// Cursor over an uncompressed payload (or a compressed one opened RAW)
pub(crate) struct RawDecoder<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> RawDecoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        RawDecoder { data, pos: 0 }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.data[self.pos as usize..];
        let n = buf.len().min(remaining.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n as u64;
        n
    }

    pub(crate) fn seek(&mut self, pos: SeekFrom) -> u64 {
        self.pos = resolve_seek(pos, self.pos, self.data.len() as u64);
        self.pos
    }

    pub(crate) fn tell(&self) -> u64 {
        self.pos
    }
}
