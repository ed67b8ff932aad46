//! Error types for image binding, lookup, and streaming reads.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RelicError>;

/// Errors surfaced by the relicfs runtime
///
/// The binder fails loudly; `resolve` reports a miss as `None` rather than
/// an error. `open`, `read`, and `seek` propagate driver errors unchanged.
/// Dropping an image or a handle never fails.
#[derive(Error, Debug)]
pub enum RelicError {
    /// Neither image bytes nor a mappable source were supplied
    #[error("image config is missing a source (bytes or file)")]
    ConfigMissing,

    /// Mapping the image source failed
    #[error("binding image source failed: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Header magic mismatch
    #[error("image magic not found")]
    BadMagic,

    /// Incompatible major format version
    #[error("image format version mismatch: image is v{found}, library reads v{expected}")]
    VersionMismatch { found: u8, expected: u8 },

    /// Image shorter than its own accounting claims
    #[error("image truncated: {needed} bytes needed, {actual} present")]
    Truncated { needed: usize, actual: usize },

    /// A structural invariant of the image does not hold
    #[error("corrupt image: {0}")]
    CorruptImage(&'static str),

    /// No entry matches the path
    #[error("no entry matches the path")]
    NotFound,

    /// The entry is a directory, not a file
    #[error("entry is a directory")]
    NotAFile,

    /// The entry is a file, not a directory
    #[error("entry is a file")]
    NotADirectory,

    /// Compression algorithm unknown or not compiled in
    #[error("unsupported compression algorithm: {0}")]
    UnsupportedCompression(u8),

    /// Decompressor initialization failed
    #[error("decompressor open failed: {0}")]
    DriverOpenFailed(&'static str),

    /// The decoder rejected the compressed payload
    #[error("corrupt compressed stream: {0}")]
    CorruptStream(String),

    /// The selected driver lacks this capability
    #[error("operation not supported by this driver")]
    Unsupported,
}
