//! The culling session state machine.
//!
//! A [`CullingSession`] owns everything a culling pass needs: the imported
//! file list, the viewer cursor, per-file ratings, the export selection, the
//! rating filter and the current [`Mode`]. All mutation goes through its
//! methods, so a presentation layer only forwards discrete [`Intent`]s and
//! reads back a [`SessionView`].
//!
//! ## Modes
//!
//! ```text
//! Import --import_files--> Culling --advance--> ReviewExport
//!        <------back------         <----back----
//! ```
//!
//! ## Ratings, filter and selection
//!
//! Ratings are `0..=5`, with 0 stored as absence. The filter is `0..=5` too:
//! 0 shows every rated photo, `n` shows exactly the `n`-star photos. The
//! selection is a separate set of names; neither the filter nor ratings ever
//! touch it.
//!
//! ## Auto-advance
//!
//! Rating a photo (other than the last) arms a short auto-advance. The session
//! does not own a timer: a driver reads [`pending_advance_deadline`] and calls
//! [`apply_due_advance`] once it passes. Manual navigation disarms it.
//!
//! [`pending_advance_deadline`]: CullingSession::pending_advance_deadline
//! [`apply_due_advance`]: CullingSession::apply_due_advance

use crate::preview::{FillOutcome, Preview, PreviewCache};
use crate::types::{Mode, SourceFile, ViewCursor};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Highest star rating and filter value.
pub const MAX_RATING: u8 = 5;

/// Zoom below this when a pinch ends snaps back to fit.
const PINCH_SNAP_THRESHOLD: f32 = 1.1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No JPEG files found in the import")]
    EmptyImport,
    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(u8),
    #[error("Filter must be between 0 and 5, got {0}")]
    InvalidFilter(u8),
}

/// Viewer behaviour while culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingSettings {
    pub auto_advance: Duration,
    pub zoom_level: f32,
    pub max_zoom: f32,
}

impl Default for CullingSettings {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_millis(250),
            zoom_level: 2.5,
            max_zoom: 5.0,
        }
    }
}

/// A discrete user action, as produced by keyboard or gesture handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Next,
    Previous,
    SetRating(u8),
    ToggleZoom,
    Pan { dx: f32, dy: f32 },
    SetFilter(u8),
    ToggleSelection(String),
    ToggleSelectAll,
    Advance,
    Back,
}

impl Intent {
    /// Intents that only make sense while looking at a single photo.
    fn is_viewer_only(&self) -> bool {
        matches!(
            self,
            Intent::Next | Intent::Previous | Intent::SetRating(_) | Intent::ToggleZoom | Intent::Pan { .. }
        )
    }
}

/// Read-only snapshot of what the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub mode: Mode,
    pub title: String,
    pub current: Option<String>,
    pub rating: u8,
    pub zoom: f32,
    pub pan: (f32, f32),
    pub filter: u8,
    pub total: usize,
    pub filtered: usize,
    pub selected: usize,
    /// Share of previews ready, while a background fill runs.
    pub fill_percent: Option<u8>,
    /// Shown in place of the grid when the filter matches nothing.
    pub empty_message: Option<String>,
}

pub struct CullingSession {
    files: Vec<SourceFile>,
    ratings: HashMap<String, u8>,
    selection: HashSet<String>,
    filter: u8,
    mode: Mode,
    cursor: ViewCursor,
    advance_due: Option<Instant>,
    pinch_start: Option<f32>,
    previews: PreviewCache,
    settings: CullingSettings,
    fill_task: Option<JoinHandle<Option<FillOutcome>>>,
}

impl CullingSession {
    pub fn new(previews: PreviewCache, settings: CullingSettings) -> Self {
        Self {
            files: Vec::new(),
            ratings: HashMap::new(),
            selection: HashSet::new(),
            filter: 0,
            mode: Mode::Import,
            cursor: ViewCursor::default(),
            advance_due: None,
            pinch_start: None,
            previews,
            settings,
            fill_task: None,
        }
    }

    pub fn previews(&self) -> &PreviewCache {
        &self.previews
    }

    pub fn settings(&self) -> &CullingSettings {
        &self.settings
    }

    /// Replace the file list with the JPEGs in `candidates`.
    ///
    /// On success the session is in [`Mode::Culling`] at the first photo and a
    /// background fill has been scheduled (when a tokio runtime is available).
    /// Returns the number of files kept.
    pub fn import_files(
        &mut self,
        candidates: impl IntoIterator<Item = SourceFile>,
    ) -> Result<usize, SessionError> {
        let mut seen = HashSet::new();
        let mut skipped = 0usize;
        let files: Vec<SourceFile> = candidates
            .into_iter()
            .filter(|f| {
                let keep = f.is_jpeg() && seen.insert(f.name.clone());
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .collect();

        if files.is_empty() {
            return Err(SessionError::EmptyImport);
        }

        self.ratings.retain(|name, _| seen.contains(name));
        self.selection.retain(|name| seen.contains(name));
        self.previews.invalidate();

        info!(files = files.len(), skipped, "imported batch");
        self.files = files;
        self.mode = Mode::Culling;
        self.cursor = ViewCursor::default();
        self.advance_due = None;
        self.pinch_start = None;
        self.fill_task = self.previews.spawn_background_fill(self.files.clone());
        Ok(self.files.len())
    }

    /// Handle of the fill spawned by the last import, if one was spawned.
    pub fn take_fill_handle(&mut self) -> Option<JoinHandle<Option<FillOutcome>>> {
        self.fill_task.take()
    }

    /// Move the cursor by `delta`. Out-of-range moves are ignored.
    pub fn navigate(&mut self, delta: isize) -> bool {
        self.advance_due = None;
        let Some(target) = self.cursor.index.checked_add_signed(delta) else {
            return false;
        };
        if delta == 0 || target >= self.files.len() {
            return false;
        }
        self.cursor = ViewCursor::at(target);
        self.pinch_start = None;
        true
    }

    /// Rate the current photo. 0 clears the rating.
    pub fn set_rating(&mut self, value: u8) -> Result<(), SessionError> {
        self.set_rating_at(value, Instant::now())
    }

    fn set_rating_at(&mut self, value: u8, now: Instant) -> Result<(), SessionError> {
        if value > MAX_RATING {
            return Err(SessionError::InvalidRating(value));
        }
        let Some(name) = self.current_file().map(|f| f.name.clone()) else {
            return Ok(());
        };
        debug!(file = %name, rating = value, "rated");
        if value == 0 {
            self.ratings.remove(&name);
        } else {
            self.ratings.insert(name, value);
        }

        let has_next = self.cursor.index + 1 < self.files.len();
        self.advance_due = (value > 0 && has_next).then(|| now + self.settings.auto_advance);
        Ok(())
    }

    /// When the armed auto-advance is due, if any.
    pub fn pending_advance_deadline(&self) -> Option<Instant> {
        self.advance_due
    }

    /// Fire the auto-advance if it is due at `now`.
    pub fn apply_due_advance(&mut self, now: Instant) -> bool {
        match self.advance_due {
            Some(due) if due <= now => {
                self.advance_due = None;
                self.mode == Mode::Culling && self.navigate(1)
            }
            _ => false,
        }
    }

    /// Flip between fit and the magnified level. Pan always resets.
    pub fn toggle_zoom(&mut self) {
        self.cursor.zoom = if self.cursor.zoom > 1.0 {
            1.0
        } else {
            self.settings.zoom_level
        };
        self.cursor.pan = (0.0, 0.0);
        self.pinch_start = None;
    }

    /// Continuous zoom, `scale` relative to the zoom when the pinch began.
    pub fn pinch_zoom(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        let start = *self.pinch_start.get_or_insert(self.cursor.zoom);
        self.cursor.zoom = (start * scale).clamp(1.0, self.settings.max_zoom);
    }

    pub fn end_pinch(&mut self) {
        self.pinch_start = None;
        if self.cursor.zoom < PINCH_SNAP_THRESHOLD {
            self.cursor.zoom = 1.0;
            self.cursor.pan = (0.0, 0.0);
        }
    }

    /// Shift the magnified photo. Ignored at fit zoom.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if self.cursor.zoom <= 1.0 {
            return false;
        }
        self.cursor.pan.0 += dx;
        self.cursor.pan.1 += dy;
        true
    }

    pub fn set_filter(&mut self, value: u8) -> Result<(), SessionError> {
        if value > MAX_RATING {
            return Err(SessionError::InvalidFilter(value));
        }
        self.filter = value;
        Ok(())
    }

    pub fn filter(&self) -> u8 {
        self.filter
    }

    /// Flip `name` in the selection. Unknown names are ignored.
    pub fn toggle_selection(&mut self, name: &str) -> bool {
        if !self.files.iter().any(|f| f.name == name) {
            return false;
        }
        if !self.selection.remove(name) {
            self.selection.insert(name.to_string());
        }
        true
    }

    /// Select the filtered subset, or deselect it if it is already fully selected.
    pub fn toggle_select_all(&mut self) {
        let subset: Vec<String> = self
            .filtered_files()
            .into_iter()
            .map(|f| f.name.clone())
            .collect();
        if subset.is_empty() {
            return;
        }
        if subset.iter().all(|n| self.selection.contains(n)) {
            for name in &subset {
                self.selection.remove(name);
            }
        } else {
            self.selection.extend(subset);
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selection.contains(name)
    }

    /// Whether `name` passes the current filter.
    pub fn passes_filter(&self, name: &str) -> bool {
        let rating = self.rating_of(name);
        if self.filter == 0 {
            rating > 0
        } else {
            rating == self.filter
        }
    }

    /// Files matching the filter, in list order.
    pub fn filtered_files(&self) -> Vec<&SourceFile> {
        self.files
            .iter()
            .filter(|f| self.passes_filter(&f.name))
            .collect()
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected files in list order, for an export job.
    pub fn selection_snapshot(&self) -> Vec<SourceFile> {
        self.files
            .iter()
            .filter(|f| self.selection.contains(&f.name))
            .cloned()
            .collect()
    }

    pub fn current_file(&self) -> Option<&SourceFile> {
        self.files.get(self.cursor.index)
    }

    pub fn rating_of(&self, name: &str) -> u8 {
        self.ratings.get(name).copied().unwrap_or(0)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cursor(&self) -> ViewCursor {
        self.cursor
    }

    /// Culling to review. Only valid while culling.
    pub fn advance(&mut self) -> bool {
        if self.mode != Mode::Culling {
            return false;
        }
        self.advance_due = None;
        self.mode = Mode::ReviewExport;
        true
    }

    pub fn back(&mut self) -> bool {
        self.advance_due = None;
        self.mode = match self.mode {
            Mode::Import => return false,
            Mode::Culling => Mode::Import,
            Mode::ReviewExport => Mode::Culling,
        };
        true
    }

    /// Dispatch a discrete intent. Viewer intents are ignored outside culling.
    pub fn apply(&mut self, intent: Intent) -> Result<(), SessionError> {
        if intent.is_viewer_only() && self.mode != Mode::Culling {
            debug!(?intent, mode = ?self.mode, "ignoring viewer intent");
            return Ok(());
        }
        match intent {
            Intent::Next => {
                self.navigate(1);
            }
            Intent::Previous => {
                self.navigate(-1);
            }
            Intent::SetRating(value) => self.set_rating(value)?,
            Intent::ToggleZoom => self.toggle_zoom(),
            Intent::Pan { dx, dy } => {
                self.pan(dx, dy);
            }
            Intent::SetFilter(value) => self.set_filter(value)?,
            Intent::ToggleSelection(name) => {
                self.toggle_selection(&name);
            }
            Intent::ToggleSelectAll => self.toggle_select_all(),
            Intent::Advance => {
                self.advance();
            }
            Intent::Back => {
                self.back();
            }
        }
        Ok(())
    }

    /// Back to an empty import screen, releasing every preview.
    pub fn reset(&mut self) {
        self.previews.invalidate();
        self.files.clear();
        self.ratings.clear();
        self.selection.clear();
        self.filter = 0;
        self.mode = Mode::Import;
        self.cursor = ViewCursor::default();
        self.advance_due = None;
        self.pinch_start = None;
        self.fill_task = None;
    }

    /// Preview for the photo under the cursor, rendering it now if needed.
    pub async fn current_preview(&self) -> Option<Preview> {
        let file = self.current_file()?;
        Some(self.previews.get(file).await)
    }

    pub fn view(&self) -> SessionView {
        let total = self.files.len();
        let filtered = self.filtered_files().len();
        let fill_percent = self
            .previews
            .is_filling()
            .then(|| self.previews.progress_percent(total));

        let title = match self.mode {
            Mode::Import => "Import".to_string(),
            Mode::Culling => {
                let mut title = format!("Cull ({}/{})", self.cursor.index + 1, total);
                if let Some(p) = fill_percent {
                    title.push_str(&format!(" • {p}%"));
                }
                title
            }
            Mode::ReviewExport => "Review".to_string(),
        };

        let empty_message = (total > 0 && filtered == 0).then(|| match self.filter {
            0 => "No rated photos yet.".to_string(),
            n => format!("No ★{n} photos."),
        });

        let current = self.current_file();
        SessionView {
            mode: self.mode,
            title,
            current: current.map(|f| f.name.clone()),
            rating: current.map_or(0, |f| self.rating_of(&f.name)),
            zoom: self.cursor.zoom,
            pan: self.cursor.pan,
            filter: self.filter,
            total,
            filtered,
            selected: self.selection.len(),
            fill_percent,
            empty_message,
        }
    }
}
