//! On-disk binary format: constants, record layouts, and entry views.
//!
//! The image is a single contiguous blob produced offline by the packer:
//!
//! ```text
//! offset 0:   Header { magic:u32, ver_major:u8, ver_minor:u8,
//!                      reserved:u16, num_entries:u32, binary_len:u32,
//!                      pad:[u8;8] }
//! offset 24:  HashEntry[num_entries] { hash:u32, offs:u32 }  (sorted by hash)
//! after:      Entry records (root directory first), each 4-byte aligned
//! end-8:      optional trailing checksum (ignored by the reader)
//! ```
//!
//! All integers are little-endian. Name strings are UTF-8, NUL-terminated,
//! and padded to the next 4-byte boundary.

use crate::error::{RelicError, Result};

/// Image magic, "RLFS" in little-endian byte order
pub const MAGIC: u32 = u32::from_le_bytes(*b"RLFS");

/// Major format version this library reads
pub const VER_MAJOR: u8 = 1;

/// Minor format version this library was built against
pub const VER_MINOR: u8 = 0;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 24;

/// Size of one hash index record
pub const HASH_ENTRY_SIZE: usize = 8;

/// Upper bound on a reconstructed path, in bytes
pub const MAX_PATH: usize = 4096;

/// Entry kind tag: directory
pub const KIND_DIR: u8 = 0;
/// Entry kind tag: file
pub const KIND_FILE: u8 = 1;

/// Compression tag: stored uncompressed
pub const COMP_NONE: u8 = 0;
/// Compression tag: DEFLATE (raw stream, no zlib wrapper)
pub const COMP_DEFLATE: u8 = 1;
/// Compression tag: Heatshrink LZSS
pub const COMP_HEATSHRINK: u8 = 2;

/// Common entry prefix: kind, compression, seg_sz, parent
const ENTRY_PREFIX_SIZE: usize = 8;
/// Directory body before the child table: child_count
const DIR_FIXED_SIZE: usize = ENTRY_PREFIX_SIZE + 4;
/// Uncompressed file record up to the name: prefix + data_sz + data_offs
const FILE_FIXED_SIZE: usize = ENTRY_PREFIX_SIZE + 8;
/// Compressed file record up to the name: file layout + real_sz + options
const COMP_FIXED_SIZE: usize = FILE_FIXED_SIZE + 8;

/// Round `n` up to the next multiple of 4.
pub(crate) const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// djb2-XOR path hash, the key function of the hash index.
///
/// `h := 5381; for each byte b: h := ((h << 5) + h) XOR b`, with 32-bit
/// wrap-around. The packer hashes full paths relative to the root with no
/// leading slash; the reader must reproduce it bit-for-bit.
pub fn path_hash(path: &str) -> u32 {
    let mut h: u32 = 5381;
    for &b in path.as_bytes() {
        h = (h.wrapping_shl(5).wrapping_add(h)) ^ b as u32;
    }
    h
}

pub(crate) fn read_u16(bytes: &[u8], off: usize) -> Option<u16> {
    let s = bytes.get(off..off + 2)?;
    Some(u16::from_le_bytes([s[0], s[1]]))
}

pub(crate) fn read_u32(bytes: &[u8], off: usize) -> Option<u32> {
    let s = bytes.get(off..off + 4)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

/// Parsed image header
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub magic: u32,
    pub ver_major: u8,
    pub ver_minor: u8,
    pub num_entries: u32,
    pub binary_len: u32,
}

impl Header {
    /// Parse and validate the fixed header at the start of an image.
    ///
    /// Checks, in order: length, magic, major version. The caller is
    /// responsible for checking that the hash index and `binary_len` fit
    /// within the mapped bytes.
    pub fn parse(bytes: &[u8]) -> Result<Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(RelicError::Truncated {
                needed: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let header = Header {
            magic: read_u32(bytes, 0).unwrap_or(0),
            ver_major: bytes[4],
            ver_minor: bytes[5],
            num_entries: read_u32(bytes, 8).unwrap_or(0),
            binary_len: read_u32(bytes, 12).unwrap_or(0),
        };

        if header.magic != MAGIC {
            return Err(RelicError::BadMagic);
        }

        if header.ver_major != VER_MAJOR {
            return Err(RelicError::VersionMismatch {
                found: header.ver_major,
                expected: VER_MAJOR,
            });
        }

        Ok(header)
    }
}

/// Entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Variant-specific entry fields
#[derive(Debug, Clone, Copy)]
pub(crate) enum EntryBody {
    Dir {
        child_count: u32,
        /// Image offset of the child offset table
        children_off: usize,
    },
    File {
        data_sz: u32,
        data_offs: u32,
    },
    Compressed {
        data_sz: u32,
        data_offs: u32,
        real_sz: u32,
        window_sz2: u8,
        lookahead_sz2: u8,
    },
}

/// A validated view of one entry record, borrowed from the image.
///
/// Entries are cheap `Copy` handles; all variable-length fields were
/// bounds-checked when the view was constructed, so accessors are
/// infallible. Two entries are equal when they name the same record of
/// the same image.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    image: &'a [u8],
    offset: u32,
    kind: EntryKind,
    compression: u8,
    seg_sz: u16,
    parent: u32,
    pub(crate) body: EntryBody,
    name_off: usize,
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && std::ptr::eq(self.image.as_ptr(), other.image.as_ptr())
    }
}

impl Eq for Entry<'_> {}

impl<'a> Entry<'a> {
    /// Parse the record at `offset`, validating alignment, bounds, the
    /// kind tag, the child table (directories), the payload range
    /// (files), and the name string. Returns `None` for anything
    /// malformed; lookups treat such records as absent.
    pub(crate) fn parse(image: &'a [u8], offset: u32) -> Option<Entry<'a>> {
        let off = offset as usize;
        if off % 4 != 0 || off + ENTRY_PREFIX_SIZE > image.len() {
            return None;
        }

        let kind_tag = image[off];
        let compression = image[off + 1];
        let seg_sz = read_u16(image, off + 2)?;
        let parent = read_u32(image, off + 4)?;

        let (kind, body, name_off) = match kind_tag {
            KIND_DIR => {
                let child_count = read_u32(image, off + 8)?;
                let children_off = off + DIR_FIXED_SIZE;
                let table_len = (child_count as usize).checked_mul(4)?;
                let name_off = children_off.checked_add(table_len)?;
                if name_off > image.len() {
                    return None;
                }
                let body = EntryBody::Dir {
                    child_count,
                    children_off,
                };
                (EntryKind::Directory, body, name_off)
            }
            KIND_FILE => {
                let data_sz = read_u32(image, off + 8)?;
                let data_offs = read_u32(image, off + 12)?;
                let data_end = (data_offs as usize).checked_add(data_sz as usize)?;
                if data_end > image.len() {
                    return None;
                }
                if compression == COMP_NONE {
                    let body = EntryBody::File { data_sz, data_offs };
                    (EntryKind::File, body, off + FILE_FIXED_SIZE)
                } else {
                    let real_sz = read_u32(image, off + 16)?;
                    let window_sz2 = *image.get(off + 20)?;
                    let lookahead_sz2 = *image.get(off + 21)?;
                    let body = EntryBody::Compressed {
                        data_sz,
                        data_offs,
                        real_sz,
                        window_sz2,
                        lookahead_sz2,
                    };
                    (EntryKind::File, body, off + COMP_FIXED_SIZE)
                }
            }
            _ => return None,
        };

        // Name plus its NUL terminator must fit.
        let name_end = name_off.checked_add(seg_sz as usize)?;
        let name_bytes = image.get(name_off..name_end)?;
        if *image.get(name_end)? != 0 {
            return None;
        }
        if std::str::from_utf8(name_bytes).is_err() {
            return None;
        }

        Some(Entry {
            image,
            offset,
            kind,
            compression,
            seg_sz,
            parent,
            body,
            name_off,
        })
    }

    /// Image offset of this record
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Entry kind
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// True for directory entries
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// True for file entries
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// True for file entries carrying a compressed payload
    pub fn is_compressed(&self) -> bool {
        self.is_file() && self.compression != COMP_NONE
    }

    /// Raw compression tag (`COMP_*`). Meaningful for files only.
    pub fn compression(&self) -> u8 {
        self.compression
    }

    /// Image offset of the parent directory entry; zero for the root
    pub fn parent_offset(&self) -> u32 {
        self.parent
    }

    /// The entry's path segment, in place. Empty for the root.
    pub fn name(&self) -> &'a str {
        let bytes = &self.image[self.name_off..self.name_off + self.seg_sz as usize];
        // Validated as UTF-8 in parse().
        std::str::from_utf8(bytes).unwrap_or("")
    }

    /// Number of children for directories, zero for files
    pub fn child_count(&self) -> u32 {
        match self.body {
            EntryBody::Dir { child_count, .. } => child_count,
            _ => 0,
        }
    }

    /// Stored payload size and offset, for files
    pub(crate) fn payload(&self) -> Option<(u32, u32)> {
        match self.body {
            EntryBody::File { data_sz, data_offs } => Some((data_sz, data_offs)),
            EntryBody::Compressed {
                data_sz, data_offs, ..
            } => Some((data_sz, data_offs)),
            EntryBody::Dir { .. } => None,
        }
    }

    /// Decompressed length for compressed files, `data_sz` otherwise
    pub(crate) fn logical_size(&self) -> u32 {
        match self.body {
            EntryBody::Dir { .. } => 0,
            EntryBody::File { data_sz, .. } => data_sz,
            EntryBody::Compressed { real_sz, .. } => real_sz,
        }
    }
}
