//! Decompressor drivers.
//!
//! A driver serves `read`/`seek`/`tell` over one file's stored payload,
//! reading compressed input directly from the image and writing decoded
//! bytes into caller-provided buffers. Drivers are selected at open time
//! and own all mutable decode state, so a handle is single-owner while
//! the image stays shareable.
//!
//! A driver that cannot honor a capability reports
//! [`RelicError::Unsupported`] instead of misbehaving; every built-in
//! driver supports the full set.

pub(crate) mod raw;

#[cfg(feature = "deflate")]
pub(crate) mod deflate;

#[cfg(feature = "heatshrink")]
pub(crate) mod heatshrink;

use std::io::SeekFrom;

use crate::error::Result;

/// Tagged driver state held by a file handle
pub(crate) enum Decoder<'a> {
    Raw(raw::RawDecoder<'a>),
    #[cfg(feature = "deflate")]
    Deflate(deflate::DeflateDecoder<'a>),
    #[cfg(feature = "heatshrink")]
    Heatshrink(heatshrink::HeatshrinkDecoder<'a>),
}

impl Decoder<'_> {
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Decoder::Raw(d) => Ok(d.read(buf)),
            #[cfg(feature = "deflate")]
            Decoder::Deflate(d) => d.read(buf),
            #[cfg(feature = "heatshrink")]
            Decoder::Heatshrink(d) => d.read(buf),
        }
    }

    pub(crate) fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match self {
            Decoder::Raw(d) => Ok(d.seek(pos)),
            #[cfg(feature = "deflate")]
            Decoder::Deflate(d) => d.seek(pos),
            #[cfg(feature = "heatshrink")]
            Decoder::Heatshrink(d) => d.seek(pos),
        }
    }

    pub(crate) fn tell(&self) -> u64 {
        match self {
            Decoder::Raw(d) => d.tell(),
            #[cfg(feature = "deflate")]
            Decoder::Deflate(d) => d.tell(),
            #[cfg(feature = "heatshrink")]
            Decoder::Heatshrink(d) => d.tell(),
        }
    }
}

/// Resolve a `SeekFrom` against a stream of `len` logical bytes,
/// clamping the result into `[0, len]`.
pub(crate) fn resolve_seek(pos: SeekFrom, current: u64, len: u64) -> u64 {
    let target = match pos {
        SeekFrom::Start(n) => n as i128,
        SeekFrom::Current(d) => current as i128 + d as i128,
        SeekFrom::End(d) => len as i128 + d as i128,
    };
    target.clamp(0, len as i128) as u64
}
