//! Camera metadata shown next to the photo being culled.
//!
//! The raw fields come from the JPEG's EXIF block via
//! [`ImageRenderer::read_metadata`]. This module decides whether there is
//! enough to show and formats the one-line summary:
//!
//! ```text
//! EOS R5 • ISO 400 • f/2.8 • 1/250s
//! ```
//!
//! ISO is the gate. A file without an ISO value is treated as having no usable
//! metadata at all, even if a model or aperture is present; edited exports
//! tend to keep a few tags and drop the rest, and a half-filled line is
//! misleading.

use crate::imaging::{ExifData, ImageRenderer};

/// Line shown when a file has no usable camera metadata.
pub const NO_METADATA: &str = "No camera metadata (use the camera's original JPEG)";

#[derive(Debug, Clone, PartialEq)]
pub struct ExifSummary {
    pub make: Option<String>,
    pub model: Option<String>,
    pub iso: u32,
    pub f_number: Option<f64>,
    pub exposure_time: Option<f64>,
}

impl ExifSummary {
    /// `"<model> • ISO <iso> • f/<f> • <shutter>s"`, leaving out absent parts.
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if let Some(camera) = self.model.as_deref().or(self.make.as_deref()) {
            parts.push(camera.to_string());
        }
        parts.push(format!("ISO {}", self.iso));
        if let Some(f) = self.f_number {
            parts.push(format!("f/{f}"));
        }
        if let Some(t) = self.exposure_time {
            parts.push(format!("{}s", format_shutter(t)));
        }
        parts.join(" • ")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reduce raw EXIF fields to a summary. `None` when ISO is missing.
pub fn summarize(exif: ExifData) -> Option<ExifSummary> {
    let iso = exif.iso?;
    Some(ExifSummary {
        make: non_empty(exif.make),
        model: non_empty(exif.model),
        iso,
        f_number: exif.f_number,
        exposure_time: exif.exposure_time,
    })
}

/// Read and summarize the metadata embedded in `bytes`.
pub fn read_summary(renderer: &dyn ImageRenderer, bytes: &[u8]) -> Option<ExifSummary> {
    summarize(renderer.read_metadata(bytes))
}

/// Shutter speed the way photographers write it.
///
/// Exposures under a second become a fraction `1/round(1/t)`; longer ones are
/// shown as is.
pub fn format_shutter(seconds: f64) -> String {
    if seconds > 0.0 && seconds < 1.0 {
        format!("1/{}", (1.0 / seconds).round())
    } else {
        format!("{seconds}")
    }
}
