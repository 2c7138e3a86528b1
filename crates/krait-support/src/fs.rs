//! File byte reading and type-signature sniffing
//!
//! The sniffing predicates return `bool` and swallow read failures: a file
//! that cannot be read is simply not of the asked-about type. This is the
//! one layer where that shortcut is acceptable.

use crate::stream;
use once_cell::sync::Lazy;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a file's full contents
pub fn read_bytes(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    stream::drain(File::open(path)?)
}

/// Case-insensitive comparison of a file name's suffix (the part after the
/// last dot)
pub fn suffix_matches(name: &str, suffix: &str) -> bool {
    let actual = name.rsplit('.').next().unwrap_or(name);
    actual.eq_ignore_ascii_case(suffix)
}

/// Whether a reader starts with the given magic bytes.
///
/// Read failures and short reads count as a mismatch.
pub fn header_matches(mut reader: impl Read, magic: &[u8]) -> bool {
    let mut buffer = vec![0u8; magic.len()];
    match reader.read_exact(&mut buffer) {
        Ok(()) => buffer == magic,
        Err(_) => false,
    }
}

/// Whether a file starts with the given magic bytes
pub fn file_header_matches(path: impl AsRef<Path>, magic: &[u8]) -> bool {
    match File::open(path) {
        Ok(file) => header_matches(file, magic),
        Err(_) => false,
    }
}

/// A file type signature: expected suffix plus leading magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// File-name suffix, without the dot
    pub suffix: &'static str,
    /// Leading magic bytes
    pub magic: &'static [u8],
}

impl Signature {
    /// Define a signature
    pub const fn new(suffix: &'static str, magic: &'static [u8]) -> Self {
        Self { suffix, magic }
    }

    /// Whether a path names a regular file with this suffix and magic
    pub fn matches_path(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if path.is_dir() {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        suffix_matches(name, self.suffix) && file_header_matches(path, self.magic)
    }
}

/// Packed unit archive (zip container)
pub const PACK: Signature = Signature::new("kpack", b"PK\x03\x04");

/// Loose compiled module
pub const MODULE: Signature = Signature::new("kmod", b"KRM\x01");

/// Signatures probed by [`detect`], in order
static BUILTIN_SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| vec![PACK, MODULE]);

/// Identify a file against the built-in signatures
pub fn detect(path: impl AsRef<Path>) -> Option<&'static Signature> {
    let path = path.as_ref();
    BUILTIN_SIGNATURES.iter().find(|s| s.matches_path(path))
}
