//! Preview cache with an epoch-guarded background fill.
//!
//! Full-resolution camera JPEGs are far too heavy to decode every time the
//! viewer moves, so each imported file gets one lightweight preview: the
//! source bounded to [`PreviewSettings::max_dimension`] and re-encoded at the
//! preview quality. The viewer and the review grid share it.
//!
//! # Two writers, one cache
//!
//! - **Background fill** ([`PreviewCache::run_background_fill`]) walks the
//!   batch in import order right after an import, skipping anything already
//!   cached, pausing after each render so interactive work is never starved.
//! - **Priority render** ([`PreviewCache::get`]) renders the photo the viewer
//!   needs right now when the fill has not reached it yet. It does not queue
//!   behind the fill; whichever finishes first wins, and both produce an
//!   equivalent preview.
//!
//! # Epochs
//!
//! Every [`invalidate`](PreviewCache::invalidate) (one per import) bumps an
//! epoch counter under the cache lock. Writers capture the epoch before they
//! start rendering and only insert if it is unchanged, so a slow fill from a
//! superseded batch can never resurrect a preview for a reused file name. A
//! fill notices the bump before its next file and stops.
//!
//! At most one fill runs per epoch. A fill left over from an older epoch does
//! not block the new batch's fill from starting.
//!
//! # Failure handling
//!
//! A file that fails to render gets its original bytes as the preview
//! ([`PreviewKind::Original`]), so the viewer always has something to show;
//! the fill continues with the next file.

use crate::imaging::{ImageRenderer, Quality, RenderTarget, render_async};
use crate::types::SourceFile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How previews are rendered and how the fill paces itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSettings {
    pub max_dimension: u32,
    pub quality: Quality,
    /// Cooperative pause after each background render.
    pub fill_delay: Duration,
    /// Emit a progress event every this many renders.
    pub progress_every: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            max_dimension: 1280,
            quality: Quality::from_percent(70),
            fill_delay: Duration::from_millis(50),
            progress_every: 5,
        }
    }
}

/// Whether a preview is a real downscale or the original as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Rendered,
    Original,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub bytes: Arc<[u8]>,
    pub kind: PreviewKind,
}

/// How a background fill ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Every file in the batch has a preview.
    Completed { rendered: usize, fallbacks: usize },
    /// A newer import invalidated the cache; the fill stopped early.
    Superseded { rendered: usize },
}

/// Side-channel notifications from the background fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillEvent {
    Progress {
        epoch: u64,
        cached: usize,
        total: usize,
    },
    Finished {
        epoch: u64,
        outcome: FillOutcome,
    },
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Preview>,
    /// Epoch of the fill currently running, if any.
    active_fill: Option<u64>,
}

struct Inner {
    renderer: Arc<dyn ImageRenderer>,
    settings: PreviewSettings,
    epoch: AtomicU64,
    state: Mutex<CacheState>,
    events: Mutex<Option<UnboundedSender<FillEvent>>>,
}

/// Shared handle to the preview cache. Clones refer to the same cache.
#[derive(Clone)]
pub struct PreviewCache {
    inner: Arc<Inner>,
}

impl PreviewCache {
    pub fn new(renderer: Arc<dyn ImageRenderer>, settings: PreviewSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                renderer,
                settings,
                epoch: AtomicU64::new(0),
                state: Mutex::new(CacheState::default()),
                events: Mutex::new(None),
            }),
        }
    }

    /// Route fill progress events to `sender`.
    pub fn set_event_sender(&self, sender: UnboundedSender<FillEvent>) {
        *self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sender);
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.inner.settings
    }

    pub fn renderer(&self) -> Arc<dyn ImageRenderer> {
        Arc::clone(&self.inner.renderer)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Nothing panics while holding the lock; recover the data regardless.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FillEvent) {
        let events = self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref() {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(event);
        }
    }

    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    /// Cached preview for `name`, without rendering.
    pub fn peek(&self, name: &str) -> Option<Preview> {
        self.lock().entries.get(name).cloned()
    }

    /// Whether a fill for the current epoch is running.
    pub fn is_filling(&self) -> bool {
        self.lock().active_fill == Some(self.epoch())
    }

    /// Share of `total` files that have a preview, as a whole percentage.
    pub fn progress_percent(&self, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        ((self.len().min(total) * 100) / total) as u8
    }

    /// Drop every cached preview and start a new epoch.
    pub fn invalidate(&self) -> u64 {
        let mut state = self.lock();
        let released = state.entries.len();
        state.entries.clear();
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(epoch, released, "preview cache invalidated");
        epoch
    }

    /// Insert unless the cache moved to a newer epoch since `epoch`.
    fn store(&self, epoch: u64, name: &str, preview: Preview) -> bool {
        let mut state = self.lock();
        if self.epoch() != epoch {
            debug!(file = name, epoch, "dropping preview for superseded batch");
            return false;
        }
        state.entries.insert(name.to_string(), preview);
        true
    }

    async fn render_preview(&self, file: &SourceFile) -> Preview {
        let settings = self.inner.settings;
        let result = render_async(
            self.renderer(),
            Arc::clone(&file.bytes),
            RenderTarget::MaxDimension(settings.max_dimension),
            settings.quality,
        )
        .await;
        match result {
            Ok(bytes) => Preview {
                bytes: bytes.into(),
                kind: PreviewKind::Rendered,
            },
            Err(e) => {
                warn!(file = %file.name, error = %e, "preview render failed, falling back to original");
                Preview {
                    bytes: Arc::clone(&file.bytes),
                    kind: PreviewKind::Original,
                }
            }
        }
    }

    /// Preview for `file`, rendering it now if nothing is cached yet.
    pub async fn get(&self, file: &SourceFile) -> Preview {
        if let Some(preview) = self.peek(&file.name) {
            return preview;
        }
        let epoch = self.epoch();
        debug!(file = %file.name, "priority render");
        let preview = self.render_preview(file).await;
        self.store(epoch, &file.name, preview.clone());
        preview
    }

    /// Claim the fill slot for the current epoch.
    fn claim_fill(&self) -> Option<u64> {
        let mut state = self.lock();
        let epoch = self.epoch();
        if state.active_fill == Some(epoch) {
            return None;
        }
        state.active_fill = Some(epoch);
        Some(epoch)
    }

    /// Release the fill slot if this fill still owns it.
    fn release_fill(&self, epoch: u64) {
        let mut state = self.lock();
        if state.active_fill == Some(epoch) {
            state.active_fill = None;
        }
    }

    async fn pause(&self) {
        let delay = self.inner.settings.fill_delay;
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }

    /// Render previews for `files` in order until done or superseded.
    ///
    /// Returns `None` without doing anything if a fill for the current epoch
    /// is already running.
    pub async fn run_background_fill(&self, files: Vec<SourceFile>) -> Option<FillOutcome> {
        let Some(epoch) = self.claim_fill() else {
            debug!("background fill already running");
            return None;
        };
        Some(self.fill_claimed(epoch, files).await)
    }

    /// Body of a fill whose slot was claimed for `epoch`, the epoch `files`
    /// belong to. Stops as soon as the cache moves past it.
    async fn fill_claimed(&self, epoch: u64, files: Vec<SourceFile>) -> FillOutcome {
        let total = files.len();
        let every = self.inner.settings.progress_every.max(1);
        let mut rendered = 0;
        let mut fallbacks = 0;
        info!(epoch, total, "background fill started");

        let mut outcome = None;
        for file in &files {
            if self.epoch() != epoch {
                outcome = Some(FillOutcome::Superseded { rendered });
                break;
            }
            if self.contains(&file.name) {
                continue;
            }

            let preview = self.render_preview(file).await;
            if preview.kind == PreviewKind::Original {
                fallbacks += 1;
            }
            if !self.store(epoch, &file.name, preview) {
                outcome = Some(FillOutcome::Superseded { rendered });
                break;
            }
            rendered += 1;

            if rendered % every == 0 {
                self.emit(FillEvent::Progress {
                    epoch,
                    cached: self.len(),
                    total,
                });
            }
            self.pause().await;
        }

        let outcome = outcome.unwrap_or(FillOutcome::Completed {
            rendered,
            fallbacks,
        });
        self.release_fill(epoch);
        match outcome {
            FillOutcome::Completed { .. } => info!(epoch, rendered, fallbacks, "background fill finished"),
            FillOutcome::Superseded { .. } => info!(epoch, rendered, "background fill superseded"),
        }
        self.emit(FillEvent::Finished { epoch, outcome });
        outcome
    }

    /// Start [`run_background_fill`](Self::run_background_fill) on the current
    /// tokio runtime without waiting for it.
    ///
    /// The fill slot is claimed for the current epoch before this returns, so
    /// `files` stay bound to the batch they were imported with even if the
    /// task first runs after another import.
    ///
    /// Returns `None` when called outside a runtime or while a fill for the
    /// current epoch is running.
    pub fn spawn_background_fill(
        &self,
        files: Vec<SourceFile>,
    ) -> Option<JoinHandle<Option<FillOutcome>>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let Some(epoch) = self.claim_fill() else {
            debug!("background fill already running");
            return None;
        };
        let cache = self.clone();
        Some(handle.spawn(async move { Some(cache.fill_claimed(epoch, files).await) }))
    }
}
