//! Image renderer trait and shared types.
//!
//! The [`ImageRenderer`] trait defines the three operations every renderer must
//! support: identify, read_metadata, and resize. Renderers work on in-memory
//! byte buffers; nothing here touches the filesystem.
//!
//! The production implementation is
//! [`JpegRenderer`](super::jpeg_renderer::JpegRenderer), pure Rust, built on
//! the `image` crate.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Quality must be in (0, 1], got {0}")]
    InvalidQuality(f32),
    #[error("Render task aborted: {0}")]
    Aborted(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Raw camera fields pulled from a JPEG's EXIF block.
///
/// Field mapping:
/// - `make` / `model`: IFD0 tags `0x010F` / `0x0110`
/// - `exposure_time`: Exif IFD `0x829A` (seconds)
/// - `f_number`: Exif IFD `0x829D`
/// - `iso`: Exif IFD `0x8827` (ISOSpeedRatings)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub make: Option<String>,
    pub model: Option<String>,
    pub iso: Option<u32>,
    pub f_number: Option<f64>,
    pub exposure_time: Option<f64>,
}

/// Trait for image renderers.
///
/// Implementations must be stateless and shareable across tasks: the preview
/// cache and the export coordinator hold one behind an `Arc` and call it from
/// blocking worker tasks.
pub trait ImageRenderer: Send + Sync {
    /// Read image dimensions without a full decode where possible.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, RenderError>;

    /// Read embedded EXIF camera fields. Missing or unparsable EXIF is not an error.
    fn read_metadata(&self, source: &[u8]) -> ExifData;

    /// Decode, flatten onto black, resize to exactly `params` and encode as JPEG.
    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, RenderError>;
}
