//! Output channels and the platform capabilities they depend on.
//!
//! Each channel reaches the outside world only through a capability trait,
//! so the coordinator can be driven by the filesystem-backed implementations
//! in [`local`](super::local) or by in-memory doubles in tests.
//!
//! | Channel | Capability | Requirement |
//! |---------|------------|-------------|
//! | [`ChannelKind::Archive`] | [`Downloader`] | none |
//! | [`ChannelKind::Folder`] | [`DirectoryPicker`] → [`DirectoryHandle`] | secure context |
//! | [`ChannelKind::Share`] | [`ShareTarget`] | none |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// One `<destination>.zip` download.
    Archive,
    /// Files written into a subfolder of a granted directory.
    Folder,
    /// Handed to the platform share sheet.
    Share,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Archive, ChannelKind::Folder, ChannelKind::Share];
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelKind::Archive => "archive",
            ChannelKind::Folder => "folder",
            ChannelKind::Share => "share",
        })
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" | "zip" => Ok(ChannelKind::Archive),
            "folder" | "dir" => Ok(ChannelKind::Folder),
            "share" => Ok(ChannelKind::Share),
            other => Err(format!(
                "unknown channel '{other}' (expected archive, folder or share)"
            )),
        }
    }
}

/// A rendered photo handed to a share target.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl SharedFile {
    pub fn jpeg(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            content_type: "image/jpeg".to_string(),
        }
    }
}

impl fmt::Debug for SharedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The user dismissed the share prompt.
    #[error("Share cancelled")]
    Cancelled,
    #[error("Share rejected: {0}")]
    Rejected(String),
}

/// Triggers a download of one finished file.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, file_name: &str, bytes: Vec<u8>) -> io::Result<()>;
}

/// A writable directory the user granted access to.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> String;

    async fn get_or_create_subfolder(&self, name: &str) -> io::Result<Arc<dyn DirectoryHandle>>;

    /// Write `bytes` to `name`, replacing any existing file.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// Ask the user for a directory. `Ok(None)` when the prompt is dismissed.
    async fn request_writable_directory(&self) -> io::Result<Option<Arc<dyn DirectoryHandle>>>;
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    fn can_share(&self, files: &[SharedFile]) -> bool;

    async fn share(&self, files: Vec<SharedFile>, title: &str, text: &str) -> Result<(), ShareError>;
}

/// What the host platform offers the exporter.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub secure_context: bool,
    pub downloader: Option<Arc<dyn Downloader>>,
    pub directory_picker: Option<Arc<dyn DirectoryPicker>>,
    pub share_target: Option<Arc<dyn ShareTarget>>,
}

impl Capabilities {
    pub fn new(secure_context: bool) -> Self {
        Self {
            secure_context,
            ..Self::default()
        }
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_directory_picker(mut self, picker: Arc<dyn DirectoryPicker>) -> Self {
        self.directory_picker = Some(picker);
        self
    }

    pub fn with_share_target(mut self, target: Arc<dyn ShareTarget>) -> Self {
        self.share_target = Some(target);
        self
    }

    pub fn availability(&self, kind: ChannelKind) -> ChannelAvailability {
        match kind {
            ChannelKind::Archive if self.downloader.is_none() => ChannelAvailability::Unsupported,
            ChannelKind::Folder if !self.secure_context => ChannelAvailability::InsecureContext,
            ChannelKind::Folder if self.directory_picker.is_none() => ChannelAvailability::Unsupported,
            ChannelKind::Share if self.share_target.is_none() => ChannelAvailability::Unsupported,
            _ => ChannelAvailability::Available,
        }
    }
}

/// Whether a channel can be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelAvailability {
    Available,
    InsecureContext,
    Unsupported,
}

impl ChannelAvailability {
    pub fn is_available(self) -> bool {
        self == ChannelAvailability::Available
    }

    /// Message for the user when `kind` cannot be used.
    pub fn hint(self, kind: ChannelKind) -> Option<&'static str> {
        match (self, kind) {
            (ChannelAvailability::Available, _) => None,
            (ChannelAvailability::InsecureContext, _) => {
                Some("Saving straight to a folder needs a secure (HTTPS) context.")
            }
            (ChannelAvailability::Unsupported, ChannelKind::Folder) => {
                Some("Saving straight to a folder needs a desktop platform.")
            }
            (ChannelAvailability::Unsupported, ChannelKind::Share) => {
                Some("This platform cannot share files directly. Use the archive instead.")
            }
            (ChannelAvailability::Unsupported, ChannelKind::Archive) => {
                Some("This platform cannot download files.")
            }
        }
    }
}
