//! Building import batches from paths on disk.
//!
//! Explicit file paths are read as given; directories are walked recursively
//! in file-name order and only `.jpg`/`.jpeg` files are read, so a folder of
//! raw files next to their JPEGs does not pull gigabytes into memory. Hidden
//! entries are skipped.
//!
//! The declared content type is sniffed from the bytes, so a JPEG with an odd
//! extension still qualifies when passed explicitly. Whether a file is
//! actually kept is decided by [`CullingSession::import_files`].
//!
//! [`CullingSession::import_files`]: crate::session::CullingSession::import_files

use crate::types::SourceFile;
use image::ImageFormat;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| e == "jpg" || e == "jpeg")
}

fn read_source(path: &Path) -> io::Result<SourceFile> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content_type = match image::guess_format(&bytes) {
        Ok(ImageFormat::Jpeg) => Some("image/jpeg"),
        _ => None,
    };
    Ok(SourceFile::new(name, bytes, content_type))
}

/// JPEG candidates under `dir`, in file-name order.
fn walk_dir(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && has_jpeg_extension(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Read every candidate file named by `paths`, preserving argument order.
pub fn collect_sources(paths: &[PathBuf]) -> io::Result<Vec<SourceFile>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = walk_dir(path);
            debug!(dir = %path.display(), files = found.len(), "walked directory");
            for file in found {
                sources.push(read_source(&file)?);
            }
        } else {
            sources.push(read_source(path)?);
        }
    }
    Ok(sources)
}
