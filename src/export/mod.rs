//! Export: re-render a selection and deliver it through one channel.
//!
//! An [`ExportJob`] carries a snapshot of the selection (in list order), the
//! render target and quality, a destination name and the channel. The
//! [`ExportCoordinator`] drives it:
//!
//! ```text
//! job ──preconditions──> render each file ──> channel delivery ──> summary
//!        (empty? capable?)     (spawn_blocking)    (zip | folder | share)
//! ```
//!
//! Preconditions fail fast, before any rendering or prompting. After that a
//! single file's decode or write failure is recorded and the batch continues.
//! Progress is reported on an optional [`ExportEvent`] channel rather than in
//! the return value.
//!
//! Dismissing a platform prompt (directory picker, share sheet) is not an
//! error; it resolves to [`ExportOutcome::Cancelled`] and the export can simply
//! be retried.

pub mod archive;
pub mod channel;
pub mod local;

pub use channel::{
    Capabilities, ChannelAvailability, ChannelKind, DirectoryHandle, DirectoryPicker, Downloader,
    ShareError, ShareTarget, SharedFile,
};

use crate::config::ExportConfig;
use crate::imaging::{ImageRenderer, Quality, RenderError, RenderTarget, render_async};
use crate::session::CullingSession;
use crate::types::SourceFile;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

pub const SHARE_TITLE: &str = "Selection - photocull";
pub const SHARE_TEXT: &str = "Culled with photocull";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing selected for export")]
    EmptySelection,
    #[error("Channel unavailable: {0}")]
    Unsupported(String),
    #[error("Folder export needs a secure context")]
    InsecureContext,
    #[error("Channel I/O failed: {0}")]
    ChannelIo(String),
    #[error("No selected photo could be rendered")]
    NothingRendered,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One export invocation.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub files: Vec<SourceFile>,
    pub target: RenderTarget,
    pub quality: Quality,
    pub destination: String,
    pub channel: ChannelKind,
}

impl ExportJob {
    /// Snapshot the session's selection with the configured export defaults.
    pub fn from_session(session: &CullingSession, config: &ExportConfig) -> Self {
        Self {
            files: session.selection_snapshot(),
            target: config.resolution,
            quality: config.quality,
            destination: config.destination.clone(),
            channel: config.channel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    ChannelStarted { channel: ChannelKind, total: usize },
    /// Sent after every file, whether it succeeded or not.
    Progress { current: usize, total: usize },
    FileFailed { name: String, reason: String },
    /// Rendering is done; the archive is being built.
    Packaging { files: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub delivered: usize,
    pub failed: Vec<String>,
    /// Archive name, folder path or share title.
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Delivered(ExportSummary),
    Cancelled,
}

pub struct ExportCoordinator {
    renderer: Arc<dyn ImageRenderer>,
    capabilities: Capabilities,
    granted: Option<Arc<dyn DirectoryHandle>>,
    events: Option<UnboundedSender<ExportEvent>>,
}

/// Rendered bytes per file, plus the names that failed.
struct Rendered {
    files: Vec<(String, Vec<u8>)>,
    failed: Vec<String>,
}

impl ExportCoordinator {
    pub fn new(renderer: Arc<dyn ImageRenderer>, capabilities: Capabilities) -> Self {
        Self {
            renderer,
            capabilities,
            granted: None,
            events: None,
        }
    }

    pub fn set_event_sender(&mut self, sender: UnboundedSender<ExportEvent>) {
        self.events = Some(sender);
    }

    fn emit(&self, event: ExportEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub fn channel_availability(&self, kind: ChannelKind) -> ChannelAvailability {
        self.capabilities.availability(kind)
    }

    /// Name of the directory remembered from an earlier folder export.
    pub fn granted_directory(&self) -> Option<String> {
        self.granted.as_ref().map(|d| d.name())
    }

    pub fn forget_directory(&mut self) {
        self.granted = None;
    }

    /// Prompt for a directory now, ahead of the export. `Ok(false)` if dismissed.
    pub async fn pick_directory(&mut self) -> Result<bool, ExportError> {
        self.check_channel(ChannelKind::Folder)?;
        Ok(self.request_directory().await?.is_some())
    }

    async fn request_directory(&mut self) -> Result<Option<Arc<dyn DirectoryHandle>>, ExportError> {
        let Some(picker) = self.capabilities.directory_picker.clone() else {
            return Err(unsupported(ChannelKind::Folder));
        };
        let granted = picker.request_writable_directory().await?;
        if let Some(dir) = &granted {
            info!(directory = %dir.name(), "directory granted");
            self.granted = Some(Arc::clone(dir));
        }
        Ok(granted)
    }

    fn check_channel(&self, kind: ChannelKind) -> Result<(), ExportError> {
        match self.channel_availability(kind) {
            ChannelAvailability::Available => Ok(()),
            ChannelAvailability::InsecureContext => Err(ExportError::InsecureContext),
            ChannelAvailability::Unsupported => Err(unsupported(kind)),
        }
    }

    pub async fn export(&mut self, job: ExportJob) -> Result<ExportOutcome, ExportError> {
        if job.files.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        self.check_channel(job.channel)?;

        let total = job.files.len();
        info!(channel = %job.channel, total, target = %job.target, "export started");
        self.emit(ExportEvent::ChannelStarted {
            channel: job.channel,
            total,
        });

        let outcome = match job.channel {
            ChannelKind::Archive => self.export_archive(&job).await?,
            ChannelKind::Folder => self.export_folder(&job).await?,
            ChannelKind::Share => self.export_share(&job).await?,
        };
        match &outcome {
            ExportOutcome::Delivered(summary) => info!(
                delivered = summary.delivered,
                failed = summary.failed.len(),
                destination = %summary.destination,
                "export delivered"
            ),
            ExportOutcome::Cancelled => info!("export cancelled by user"),
        }
        Ok(outcome)
    }

    async fn render_one(&self, file: &SourceFile, job: &ExportJob) -> Result<Vec<u8>, RenderError> {
        render_async(
            Arc::clone(&self.renderer),
            Arc::clone(&file.bytes),
            job.target,
            job.quality,
        )
        .await
    }

    fn record_failure(&self, failed: &mut Vec<String>, name: &str, reason: String) {
        warn!(file = name, %reason, "export skipped file");
        self.emit(ExportEvent::FileFailed {
            name: name.to_string(),
            reason,
        });
        failed.push(name.to_string());
    }

    /// Render every file, skipping failures and names that are not plain or repeat.
    async fn render_all(&self, job: &ExportJob) -> Rendered {
        let total = job.files.len();
        let mut rendered = Rendered {
            files: Vec::with_capacity(total),
            failed: Vec::new(),
        };
        let mut names = HashSet::new();
        for (i, file) in job.files.iter().enumerate() {
            if let Err(e) = local::checked_name(&file.name) {
                self.record_failure(&mut rendered.failed, &file.name, e.to_string());
            } else if !names.insert(file.name.as_str()) {
                self.record_failure(&mut rendered.failed, &file.name, "duplicate name".to_string());
            } else {
                match self.render_one(file, job).await {
                    Ok(bytes) => rendered.files.push((file.name.clone(), bytes)),
                    Err(e) => self.record_failure(&mut rendered.failed, &file.name, e.to_string()),
                }
            }
            self.emit(ExportEvent::Progress {
                current: i + 1,
                total,
            });
        }
        rendered
    }

    async fn export_archive(&self, job: &ExportJob) -> Result<ExportOutcome, ExportError> {
        let Some(downloader) = self.capabilities.downloader.clone() else {
            return Err(unsupported(ChannelKind::Archive));
        };
        let Rendered { files, failed } = self.render_all(job).await;
        if files.is_empty() {
            return Err(ExportError::NothingRendered);
        }

        let delivered = files.len();
        self.emit(ExportEvent::Packaging { files: delivered });
        let bytes = archive::build_archive_async(files).await?;
        let name = archive::archive_file_name(&job.destination);
        downloader
            .download(&name, bytes)
            .await
            .map_err(|e| ExportError::ChannelIo(format!("{name}: {e}")))?;

        Ok(ExportOutcome::Delivered(ExportSummary {
            delivered,
            failed,
            destination: name,
        }))
    }

    async fn export_folder(&mut self, job: &ExportJob) -> Result<ExportOutcome, ExportError> {
        let granted = match self.granted.clone() {
            Some(dir) => Some(dir),
            None => self.request_directory().await?,
        };
        let Some(root) = granted else {
            return Ok(ExportOutcome::Cancelled);
        };
        let folder = root
            .get_or_create_subfolder(&job.destination)
            .await
            .map_err(|e| ExportError::ChannelIo(format!("{}: {e}", job.destination)))?;

        let total = job.files.len();
        let mut delivered = 0;
        let mut failed = Vec::new();
        for (i, file) in job.files.iter().enumerate() {
            match self.render_one(file, job).await {
                Ok(bytes) => match folder.write_file(&file.name, &bytes).await {
                    Ok(()) => delivered += 1,
                    Err(e) => self.record_failure(&mut failed, &file.name, e.to_string()),
                },
                Err(e) => self.record_failure(&mut failed, &file.name, e.to_string()),
            }
            self.emit(ExportEvent::Progress {
                current: i + 1,
                total,
            });
        }

        Ok(ExportOutcome::Delivered(ExportSummary {
            delivered,
            failed,
            destination: format!("{}/{}", root.name(), folder.name()),
        }))
    }

    async fn export_share(&self, job: &ExportJob) -> Result<ExportOutcome, ExportError> {
        let Some(target) = self.capabilities.share_target.clone() else {
            return Err(unsupported(ChannelKind::Share));
        };
        let Rendered { files, failed } = self.render_all(job).await;
        if files.is_empty() {
            return Err(ExportError::NothingRendered);
        }

        let shared: Vec<SharedFile> = files
            .into_iter()
            .map(|(name, bytes)| SharedFile::jpeg(name, bytes))
            .collect();
        if !target.can_share(&shared) {
            return Err(ExportError::Unsupported(
                "the platform cannot share this set of files; try fewer photos".into(),
            ));
        }

        let delivered = shared.len();
        match target.share(shared, SHARE_TITLE, SHARE_TEXT).await {
            Ok(()) => Ok(ExportOutcome::Delivered(ExportSummary {
                delivered,
                failed,
                destination: SHARE_TITLE.to_string(),
            })),
            Err(ShareError::Cancelled) => Ok(ExportOutcome::Cancelled),
            Err(ShareError::Rejected(reason)) => Err(ExportError::ChannelIo(reason)),
        }
    }
}

fn unsupported(kind: ChannelKind) -> ExportError {
    let hint = ChannelAvailability::Unsupported
        .hint(kind)
        .unwrap_or("channel unavailable");
    ExportError::Unsupported(hint.to_string())
}
