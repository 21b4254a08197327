//! High-level image operations.
//!
//! These functions combine calculations with renderer execution. They take a
//! render target, compute the output size, and call the renderer.

use super::backend::{ImageRenderer, RenderError};
use super::calculations::fit_within;
use super::params::{Quality, RenderTarget, ResizeParams};
use std::sync::Arc;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Render `source` to `target` at `quality`.
///
/// `RenderTarget::Original` returns the source bytes untouched, without a
/// decode. Otherwise the image is bounded to the target on its longer edge
/// (never upscaled) and re-encoded as JPEG.
pub fn render(
    renderer: &dyn ImageRenderer,
    source: &[u8],
    target: RenderTarget,
    quality: Quality,
) -> Result<Vec<u8>> {
    let max_dimension = match target {
        RenderTarget::Original => return Ok(source.to_vec()),
        RenderTarget::MaxDimension(px) => px,
    };

    let dims = renderer.identify(source)?;
    let (width, height) = fit_within((dims.width, dims.height), max_dimension);
    renderer.resize(
        source,
        &ResizeParams {
            width,
            height,
            quality,
        },
    )
}

/// Run [`render`] on the blocking pool and await it.
///
/// Decode and encode are CPU-bound; awaiting them here is the suspension point
/// that keeps navigation and rating responsive while batches render.
pub async fn render_async(
    renderer: Arc<dyn ImageRenderer>,
    source: Arc<[u8]>,
    target: RenderTarget,
    quality: Quality,
) -> Result<Vec<u8>> {
    if target == RenderTarget::Original {
        return Ok(source.to_vec());
    }
    tokio::task::spawn_blocking(move || render(renderer.as_ref(), &source, target, quality))
        .await
        .map_err(|e| RenderError::Aborted(e.to_string()))?
}
