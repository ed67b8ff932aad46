//! # relicfs - Read-Only Archive Filesystem
//!
//! `relicfs` is the runtime access library for a read-only, content-addressed
//! archive filesystem packed into a single contiguous binary image. The image
//! is produced offline by a packer, then consumed in-place: memory-mapped
//! from flash on an embedded target, or loaded into a buffer on a host.
//!
//! - **Zero-copy lookups** over a flat blob: entries, names, and payloads are
//!   borrows tied to the image lifetime
//! - **Sorted hash index** with djb2-XOR keys and collision disambiguation by
//!   full-path reconstruction
//! - **Streaming decompression** (DEFLATE, Heatshrink) behind a driver
//!   interface with seekable semantics over forward-only streams
//! - **Immutable after bind**: lookups, stats, and directory iteration are
//!   freely concurrent; open handles own their decode state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relicfs::{Image, ImageConfig, OpenFlags, Result};
//!
//! # fn main() -> Result<()> {
//! # let flash: &[u8] = &[];
//! // Bind pre-mapped image bytes (or use `.file(path)` with the `mmap`
//! // feature to map an image file read-only).
//! let fs = Image::bind(ImageConfig::new().bytes(flash))?;
//!
//! // Resolve and stream a file.
//! let entry = fs.resolve("www/index.html").expect("packed file");
//! let mut handle = fs.open(&entry, OpenFlags::empty())?;
//! let mut buf = [0u8; 256];
//! while handle.read(&mut buf)? > 0 {
//!     // ...
//! }
//!
//! // Walk a directory in stored order.
//! for child in fs.open_dir(None)? {
//!     let st = fs.stat(&child);
//!     println!("{} ({} bytes)", child.name(), st.size);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cargo features
//!
//! - `deflate` (default): DEFLATE driver via `flate2`
//! - `heatshrink` (default): Heatshrink LZSS driver
//! - `mmap` (default): bind images by mapping a file via `memmap2`
//!
//! Opening an entry whose compression driver is not compiled in fails with
//! [`RelicError::UnsupportedCompression`].

mod decomp;
pub mod dir;
pub mod error;
pub mod format;
pub mod handle;
pub mod image;
mod resolve;

pub use dir::DirHandle;
pub use error::{RelicError, Result};
pub use format::{path_hash, Entry, EntryKind, Header, MAGIC, MAX_PATH, VER_MAJOR, VER_MINOR};
pub use handle::{FileHandle, OpenFlags};
pub use image::{Image, ImageConfig, Stat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
