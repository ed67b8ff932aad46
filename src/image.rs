//! Image binding: validate a packed image and derive the lookup pointers.

use crate::error::{RelicError, Result};
use crate::format::{
    read_u32, Entry, EntryBody, EntryKind, Header, COMP_NONE, HASH_ENTRY_SIZE, HEADER_SIZE,
};

/// Where the image bytes come from
///
/// On embedded targets the image is typically already mapped (flash mmap)
/// and handed over as a borrowed slice. On hosts the `mmap` feature maps a
/// file read-only instead, the moral equivalent of naming a data partition.
#[derive(Debug, Default)]
pub struct ImageConfig<'a> {
    bytes: Option<&'a [u8]>,
    #[cfg(feature = "mmap")]
    file: Option<std::path::PathBuf>,
}

impl<'a> ImageConfig<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind against pre-mapped or pre-loaded image bytes.
    pub fn bytes(mut self, bytes: &'a [u8]) -> Self {
        self.bytes = Some(bytes);
        self
    }

    /// Bind by memory-mapping the named file read-only.
    #[cfg(feature = "mmap")]
    pub fn file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

#[derive(Debug)]
enum ImageBytes<'a> {
    Borrowed(&'a [u8]),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::Mmap),
}

impl ImageBytes<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            ImageBytes::Borrowed(b) => b,
            #[cfg(feature = "mmap")]
            ImageBytes::Mapped(m) => m,
        }
    }
}

/// Metadata returned by [`Image::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub kind: EntryKind,
    /// Raw compression tag (`COMP_*`); `COMP_NONE` for directories
    pub compression: u8,
    /// Logical (decompressed) size; zero for directories
    pub size: u32,
    /// Stored size; equals `size` for uncompressed files
    pub compressed_size: u32,
}

/// A bound, validated image
///
/// The image is immutable once bound; any number of threads may resolve,
/// stat, and iterate concurrently. Entries, file handles, and directory
/// handles borrow from the image and cannot outlive it. Dropping the
/// image unmaps the file when the binder owns the mapping.
#[derive(Debug)]
pub struct Image<'a> {
    bytes: ImageBytes<'a>,
    num_entries: u32,
    ver_minor: u8,
    /// Image length per the header, clamped into the mapped bytes
    len: usize,
    root_offset: u32,
}

impl<'a> Image<'a> {
    /// Bind an image, validating the header and the hash index.
    ///
    /// Checks in order: a source is configured, the magic matches, the
    /// major version matches, the hash index and the claimed image length
    /// fit within the mapped bytes, the index is sorted ascending by
    /// hash, and the root directory entry is well formed.
    pub fn bind(config: ImageConfig<'a>) -> Result<Image<'a>> {
        let bytes = match config.bytes {
            Some(b) => ImageBytes::Borrowed(b),
            #[cfg(feature = "mmap")]
            None => match config.file {
                Some(path) => {
                    let file = std::fs::File::open(&path)?;
                    // Safety: the mapping is private and read-only; the
                    // image contract makes the backing file immutable.
                    let map = unsafe { memmap2::Mmap::map(&file)? };
                    ImageBytes::Mapped(map)
                }
                None => return Err(RelicError::ConfigMissing),
            },
            #[cfg(not(feature = "mmap"))]
            None => return Err(RelicError::ConfigMissing),
        };

        let data = bytes.as_slice();
        let header = Header::parse(data)?;

        let index_end = HEADER_SIZE + header.num_entries as usize * HASH_ENTRY_SIZE;
        let needed = index_end.max(header.binary_len as usize);
        if needed > data.len() {
            return Err(RelicError::Truncated {
                needed,
                actual: data.len(),
            });
        }
        // A mapped partition may be larger than the image it carries.
        let len = (header.binary_len as usize).max(index_end);

        let image = Image {
            bytes,
            num_entries: header.num_entries,
            ver_minor: header.ver_minor,
            len,
            root_offset: index_end as u32,
        };

        let data = image.data();
        let mut prev = 0u32;
        for i in 0..image.num_entries as usize {
            let hash = read_u32(data, HEADER_SIZE + i * HASH_ENTRY_SIZE)
                .ok_or(RelicError::CorruptImage("hash index out of bounds"))?;
            if i > 0 && hash < prev {
                return Err(RelicError::CorruptImage("hash index not sorted"));
            }
            prev = hash;
        }

        if image.num_entries > 0 {
            let root = Entry::parse(data, image.root_offset)
                .ok_or(RelicError::CorruptImage("root entry malformed"))?;
            if !root.is_dir() || root.parent_offset() != 0 {
                return Err(RelicError::CorruptImage("first entry is not the root"));
            }
        } else {
            return Err(RelicError::CorruptImage("image has no entries"));
        }

        tracing::debug!(
            num_entries = image.num_entries,
            len = image.len,
            "bound image"
        );

        Ok(image)
    }

    /// Image bytes, bounded by the header's `binary_len`
    pub(crate) fn data(&self) -> &[u8] {
        &self.bytes.as_slice()[..self.len]
    }

    /// Total number of entries (files and directories)
    pub fn num_entries(&self) -> u32 {
        self.num_entries
    }

    /// Image length in bytes, including any trailing checksum
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Minor version recorded in the image header
    pub fn ver_minor(&self) -> u8 {
        self.ver_minor
    }

    /// The root directory entry
    pub fn root(&'a self) -> Entry<'a> {
        match Entry::parse(self.data(), self.root_offset) {
            Some(entry) => entry,
            // Validated during bind.
            None => unreachable!("root entry validated at bind"),
        }
    }

    /// Parse the entry record at `offs`, if it is within entry storage
    /// and well formed.
    pub(crate) fn entry_at(&'a self, offs: u32) -> Option<Entry<'a>> {
        if offs < self.root_offset {
            return None;
        }
        Entry::parse(self.data(), offs)
    }

    /// Hash index record `i`, as `(hash, offs)`.
    pub(crate) fn hash_entry(&self, i: usize) -> (u32, u32) {
        let off = HEADER_SIZE + i * HASH_ENTRY_SIZE;
        let data = self.data();
        // The index extent was validated at bind.
        (
            read_u32(data, off).unwrap_or(0),
            read_u32(data, off + 4).unwrap_or(0),
        )
    }

    /// Entry metadata: kind, compression, logical and stored sizes.
    pub fn stat(&self, entry: &Entry<'_>) -> Stat {
        match entry.body {
            EntryBody::Dir { .. } => Stat {
                kind: EntryKind::Directory,
                compression: COMP_NONE,
                size: 0,
                compressed_size: 0,
            },
            EntryBody::File { data_sz, .. } => Stat {
                kind: EntryKind::File,
                compression: COMP_NONE,
                size: data_sz,
                compressed_size: data_sz,
            },
            EntryBody::Compressed {
                data_sz, real_sz, ..
            } => Stat {
                kind: EntryKind::File,
                compression: entry.compression(),
                size: real_sz,
                compressed_size: data_sz,
            },
        }
    }
}
