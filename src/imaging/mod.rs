//! Image rendering: pure Rust, in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **EXIF metadata** | custom parser (JPEG APP1 + TIFF IFD) |
//! | **Render → JPEG** | flatten onto black + Lanczos3 + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality, render target and resize parameters
//! - **Backend**: [`ImageRenderer`] trait + [`JpegRenderer`]
//! - **Operations**: [`render`] / [`render_async`], combining calculations + renderer

pub mod backend;
mod calculations;
pub(crate) mod exif_parser;
pub mod jpeg_renderer;
pub mod operations;
mod params;

pub use backend::{Dimensions, ExifData, ImageRenderer, RenderError};
pub use calculations::fit_within;
pub use jpeg_renderer::JpegRenderer;
pub use operations::{render, render_async};
pub use params::{Quality, RenderTarget, ResizeParams};
