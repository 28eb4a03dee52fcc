//! Gzip tar handling: extracting downloaded archives and packing fetched
//! projects into cache entries.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder, HeaderMode};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::package::manifest::MANIFEST_FILE;

/// Directories never copied into a package archive.
pub const SKIPPED_DIRS: [&str; 2] = [".git", "node_modules"];

fn archive_error(path: &Path, e: impl ToString) -> Error {
    Error::Archive {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Unpacks the gzip tar at `archive` into `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| archive_error(archive, e))?;
    Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(|e| archive_error(archive, e))
}

/// The project directory inside an extracted archive.
///
/// Archives downloaded over HTTP wrap the tree in a single top-level
/// directory; descend into it unless a manifest sits at the top.
pub fn project_root(dir: &Path) -> Result<PathBuf> {
    if dir.join(MANIFEST_FILE).exists() {
        return Ok(dir.to_path_buf());
    }

    let entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if let [only] = entries.as_slice() {
        if only.file_type()?.is_dir() {
            return Ok(only.path());
        }
    }
    Ok(dir.to_path_buf())
}

/// Writes `source` as a gzip tar into `writer`, every entry under `prefix`.
///
/// Entries are sorted and carry deterministic headers, so packing the same
/// tree twice yields the same bytes.
pub fn pack<W: Write>(source: &Path, prefix: &Path, writer: W, level: u32) -> Result<W> {
    let encoder = GzEncoder::new(writer, Compression::new(level));
    let mut builder = Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|skip| entry.file_name() == *skip))
        });

    for entry in walker {
        let entry = entry.map_err(|e| archive_error(source, e))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| archive_error(entry.path(), e))?;
        let name = prefix.join(relative);

        let appended = if entry.file_type().is_dir() {
            builder.append_dir(&name, entry.path())
        } else {
            builder.append_path_with_name(entry.path(), &name)
        };
        appended.map_err(|e| archive_error(entry.path(), e))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| archive_error(source, e))?;
    encoder.finish().map_err(|e| archive_error(source, e))
}

/// Reads a single file out of a gzip tar, if present.
pub fn read_entry(archive: &Path, entry: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(archive).map_err(|e| archive_error(archive, e))?;
    let mut tar = Archive::new(GzDecoder::new(file));

    for item in tar.entries().map_err(|e| archive_error(archive, e))? {
        let mut item = item.map_err(|e| archive_error(archive, e))?;
        let path = item.path().map_err(|e| archive_error(archive, e))?;
        if path == entry {
            let mut content = Vec::new();
            item.read_to_end(&mut content)
                .map_err(|e| archive_error(archive, e))?;
            return Ok(Some(content));
        }
    }
    Ok(None)
}

/// Paths of all entries in a gzip tar.
pub fn list_entries(archive: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive).map_err(|e| archive_error(archive, e))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    let mut paths = Vec::new();
    for item in tar.entries().map_err(|e| archive_error(archive, e))? {
        let item = item.map_err(|e| archive_error(archive, e))?;
        let path = item.path().map_err(|e| archive_error(archive, e))?;
        paths.push(path.into_owned());
    }
    Ok(paths)
}
