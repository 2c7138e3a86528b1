//! Krait Support Utilities
//!
//! Small, self-contained I/O conveniences used around the runtime but
//! sharing no invariants with it:
//! - File byte reading and type-signature sniffing
//! - Reader draining
//! - An immutable key/value pair wrapper
//! - Loadable-unit on-disk location resolution (loose files and packed
//!   archives)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod entry;
pub mod fs;
pub mod locate;
pub mod stream;

pub use entry::FrozenEntry;
pub use fs::Signature;
pub use locate::UnitOrigin;

use std::path::PathBuf;

/// Support-layer errors
#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Archive could not be read
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),

    /// Archive exists but the named entry does not
    #[error("No entry {entry} in archive {}", .archive.display())]
    MissingEntry {
        /// Archive path
        archive: PathBuf,
        /// Entry name looked up
        entry: String,
    },

    /// A loose origin did not point at a regular file
    #[error("Origin is not a file: {}", .0.display())]
    NotAFile(PathBuf),
}

/// Support-layer result
pub type SupportResult<T> = Result<T, SupportError>;
