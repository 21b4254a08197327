//! Filesystem-backed capabilities for running the exporter from a terminal.
//!
//! - [`FsDownloader`] drops finished downloads into an output directory.
//! - [`FsDirectoryPicker`] "grants" one fixed directory, creating it on demand.
//! - [`FsDirectory`] implements the directory handle over `tokio::fs`.
//!
//! There is no share sheet on a terminal, so no share target lives here.

use super::channel::{DirectoryHandle, DirectoryPicker, Downloader};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Reject names that would escape the directory or archive they are written into.
pub(crate) fn checked_name(name: &str) -> io::Result<&str> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if plain {
        Ok(name)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a plain file name: {name:?}"),
        ))
    }
}

pub struct FsDownloader {
    out_dir: PathBuf,
}

impl FsDownloader {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl Downloader for FsDownloader {
    async fn download(&self, file_name: &str, bytes: Vec<u8>) -> io::Result<()> {
        let path = self.out_dir.join(checked_name(file_name)?);
        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "download written");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FsDirectory {
    path: PathBuf,
}

impl FsDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for FsDirectory {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn get_or_create_subfolder(&self, name: &str) -> io::Result<Arc<dyn DirectoryHandle>> {
        let path = self.path.join(checked_name(name)?);
        tokio::fs::create_dir_all(&path).await?;
        Ok(Arc::new(FsDirectory { path }))
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.path.join(checked_name(name)?), bytes).await
    }
}

/// Grants a single preconfigured directory without prompting.
pub struct FsDirectoryPicker {
    root: PathBuf,
}

impl FsDirectoryPicker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DirectoryPicker for FsDirectoryPicker {
    async fn request_writable_directory(&self) -> io::Result<Option<Arc<dyn DirectoryHandle>>> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(Some(Arc::new(FsDirectory::new(self.root.clone()))))
    }
}
