//! File handles: bind an entry to a decompressor driver and route I/O.

use std::io::{self, SeekFrom};

use bitflags::bitflags;

use crate::decomp::{raw::RawDecoder, Decoder};
use crate::error::{RelicError, Result};
use crate::format::{Entry, COMP_NONE};
use crate::image::Image;

bitflags! {
    /// Flags accepted by [`Image::open`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OpenFlags: u32 {
        /// Bypass decompression and surface the stored bytes as-is
        const RAW = 1 << 0;
    }
}

/// An open file, exclusively owned by its opener
///
/// The handle owns the driver state; `read`/`seek`/`tell` mutate it, so
/// sharing a handle across threads requires external locking. Dropping
/// the handle releases everything it owns.
pub struct FileHandle<'a> {
    /// Stored payload bytes, straight from the image
    payload: &'a [u8],
    logical_size: u64,
    flags: OpenFlags,
    decoder: Decoder<'a>,
}

impl<'a> Image<'a> {
    /// Open a file entry for streaming reads.
    ///
    /// Directories are rejected with [`RelicError::NotAFile`]. With
    /// [`OpenFlags::RAW`] the raw driver is selected regardless of the
    /// entry's compression and the handle's logical size is the stored
    /// size. A compression tag that is unknown, or whose driver is not
    /// compiled in, yields [`RelicError::UnsupportedCompression`].
    pub fn open(&'a self, entry: &Entry<'a>, flags: OpenFlags) -> Result<FileHandle<'a>> {
        let Some((data_sz, data_offs)) = entry.payload() else {
            return Err(RelicError::NotAFile);
        };

        // Payload bounds were validated when the entry was parsed.
        let start = data_offs as usize;
        let payload = &self.data()[start..start + data_sz as usize];

        if flags.contains(OpenFlags::RAW) || entry.compression() == COMP_NONE {
            return Ok(FileHandle {
                payload,
                logical_size: data_sz as u64,
                flags,
                decoder: Decoder::Raw(RawDecoder::new(payload)),
            });
        }

        let decoder = match entry.compression() {
            #[cfg(feature = "deflate")]
            crate::format::COMP_DEFLATE => Decoder::Deflate(
                crate::decomp::deflate::DeflateDecoder::new(payload, entry.logical_size()),
            ),
            #[cfg(feature = "heatshrink")]
            crate::format::COMP_HEATSHRINK => {
                let crate::format::EntryBody::Compressed {
                    window_sz2,
                    lookahead_sz2,
                    ..
                } = entry.body
                else {
                    return Err(RelicError::CorruptImage("compressed entry without options"));
                };
                Decoder::Heatshrink(crate::decomp::heatshrink::HeatshrinkDecoder::new(
                    payload,
                    entry.logical_size(),
                    window_sz2,
                    lookahead_sz2,
                )?)
            }
            other => {
                tracing::warn!(compression = other, "unsupported compression tag");
                return Err(RelicError::UnsupportedCompression(other));
            }
        };

        Ok(FileHandle {
            payload,
            logical_size: entry.logical_size() as u64,
            flags,
            decoder,
        })
    }

    /// Resolve a path and open it in one step.
    ///
    /// Unlike [`Image::resolve`], a miss here is an error, which lets
    /// callers bubble the whole open chain with `?`.
    pub fn open_path(&'a self, path: &str, flags: OpenFlags) -> Result<FileHandle<'a>> {
        let entry = self.resolve(path).ok_or(RelicError::NotFound)?;
        self.open(&entry, flags)
    }
}

impl<'a> FileHandle<'a> {
    /// Read up to `buf.len()` decoded bytes. Returns 0 at end of stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.decoder.read(buf)
    }

    /// Reposition the logical stream. The result is clamped into
    /// `[0, logical size]`; seeking backward on a compression driver
    /// restarts the stream and re-decodes forward.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.decoder.seek(pos)
    }

    /// Current logical position
    pub fn tell(&self) -> u64 {
        self.decoder.tell()
    }

    /// Logical stream length: decompressed size, or stored size when
    /// opened RAW or uncompressed
    pub fn size(&self) -> u64 {
        self.logical_size
    }

    /// The stored payload bytes, untouched by any driver.
    ///
    /// Useful for passing pre-compressed content through verbatim. The
    /// slice stays valid for the image borrow, independent of this
    /// handle.
    pub fn access(&self) -> &'a [u8] {
        self.payload
    }

    /// True when the handle was opened with [`OpenFlags::RAW`]
    pub fn is_raw(&self) -> bool {
        self.flags.contains(OpenFlags::RAW)
    }
}

impl io::Read for FileHandle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileHandle::read(self, buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl io::Seek for FileHandle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        FileHandle::seek(self, pos).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
