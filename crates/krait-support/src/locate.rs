//! Loadable-unit location resolution
//!
//! A unit either sits loose on disk or inside a packed archive. Resolution
//! returns a real file path either way, extracting packed entries into a
//! caller-supplied cache directory on first use.

use crate::{SupportError, SupportResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Where a loadable unit lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOrigin {
    /// A loose file on disk
    Loose(PathBuf),
    /// An entry inside a packed archive
    Packed {
        /// Archive path
        archive: PathBuf,
        /// Entry name inside the archive
        entry: String,
    },
}

/// Resolve a unit's on-disk location.
///
/// Loose units resolve to themselves. Packed units are extracted into
/// `cache_dir` under the entry's file name; an already-extracted copy is
/// reused without touching the archive again.
pub fn resolve_origin(origin: &UnitOrigin, cache_dir: &Path) -> SupportResult<PathBuf> {
    match origin {
        UnitOrigin::Loose(path) => {
            if path.is_file() {
                Ok(path.clone())
            } else {
                Err(SupportError::NotAFile(path.clone()))
            }
        }
        UnitOrigin::Packed { archive, entry } => {
            let file_name = Path::new(entry)
                .file_name()
                .ok_or_else(|| SupportError::MissingEntry {
                    archive: archive.clone(),
                    entry: entry.clone(),
                })?;
            let target = cache_dir.join(file_name);
            if !target.exists() {
                fs::create_dir_all(cache_dir)?;
                extract_entry(archive, entry, &target)?;
            }
            Ok(target)
        }
    }
}

fn extract_entry(archive: &Path, entry: &str, target: &Path) -> SupportResult<()> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut packed = zip.by_name(entry).map_err(|e| match e {
        ZipError::FileNotFound => SupportError::MissingEntry {
            archive: archive.to_path_buf(),
            entry: entry.to_string(),
        },
        other => SupportError::Archive(other),
    })?;
    let mut out = File::create(target)?;
    io::copy(&mut packed, &mut out)?;
    Ok(())
}
