//! Shared test utilities for the photocull test suite.
//!
//! Provides synthetic image fixtures (real JPEG/PNG bytes, EXIF-tagged JPEGs)
//! and builders for [`SourceFile`] batches backed by the mock renderer's
//! `WxH:payload` byte convention.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let files = mock_batch(&["a.jpg", "b.jpg", "c.jpg"]);
//! let mut session = session_with_mock(MockRenderer::new());
//! session.import_files(files).unwrap();
//! ```

use crate::config::CullConfig;
use crate::imaging::backend::tests::{MockRenderer, mock_source};
use crate::preview::PreviewCache;
use crate::session::CullingSession;
use crate::types::SourceFile;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::sync::Arc;

// =========================================================================
// Image fixtures
// =========================================================================

/// Encode a gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a fully transparent white PNG.
pub fn transparent_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 0]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

/// Camera fields written by [`jpeg_with_exif`].
pub struct ExifFixture {
    pub make: &'static str,
    pub model: &'static str,
    pub iso: Option<u16>,
    pub f_number: (u32, u32),
    pub exposure: (u32, u32),
}

impl Default for ExifFixture {
    fn default() -> Self {
        Self {
            make: "Canon",
            model: "EOS R5",
            iso: Some(400),
            f_number: (28, 10),
            exposure: (1, 250),
        }
    }
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&typ.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
}

/// Build a minimal JPEG (SOI + APP1 Exif + EOI) carrying the fixture fields.
///
/// Layout of the little-endian TIFF block: header at 0, IFD0 (3 entries) at 8,
/// Exif IFD at 50, then the out-of-line data area. Strings must be longer than
/// three characters so they are stored out of line.
pub fn jpeg_with_exif(fixture: &ExifFixture) -> Vec<u8> {
    let make = format!("{}\0", fixture.make);
    let model = format!("{}\0", fixture.model);
    let exif_entries: u16 = if fixture.iso.is_some() { 3 } else { 2 };

    let ifd0_offset = 8u32;
    let exif_offset = ifd0_offset + 2 + 3 * 12 + 4;
    let data_start = exif_offset + 2 + exif_entries as u32 * 12 + 4;
    let make_off = data_start;
    let model_off = make_off + make.len() as u32;
    let exposure_off = model_off + model.len() as u32;
    let f_number_off = exposure_off + 8;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&ifd0_offset.to_le_bytes());

    tiff.extend_from_slice(&3u16.to_le_bytes());
    ifd_entry(&mut tiff, 0x010F, 2, make.len() as u32, make_off);
    ifd_entry(&mut tiff, 0x0110, 2, model.len() as u32, model_off);
    ifd_entry(&mut tiff, 0x8769, 4, 1, exif_offset);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&exif_entries.to_le_bytes());
    ifd_entry(&mut tiff, 0x829A, 5, 1, exposure_off);
    ifd_entry(&mut tiff, 0x829D, 5, 1, f_number_off);
    if let Some(iso) = fixture.iso {
        ifd_entry(&mut tiff, 0x8827, 3, 1, iso as u32);
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());

    assert_eq!(tiff.len() as u32, data_start);
    tiff.extend_from_slice(make.as_bytes());
    tiff.extend_from_slice(model.as_bytes());
    tiff.extend_from_slice(&fixture.exposure.0.to_le_bytes());
    tiff.extend_from_slice(&fixture.exposure.1.to_le_bytes());
    tiff.extend_from_slice(&fixture.f_number.0.to_le_bytes());
    tiff.extend_from_slice(&fixture.f_number.1.to_le_bytes());

    let seg_len = (2 + 6 + tiff.len()) as u16;
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// A decodable `width`x`height` JPEG whose APP1 block carries only an IFD0
/// Orientation tag (`1`-`8`).
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    ifd_entry(&mut tiff, 0x0112, 3, 1, orientation as u32);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let seg_len = (2 + 6 + tiff.len()) as u16;
    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&seg_len.to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let encoded = jpeg_bytes(width, height);
    let mut out = encoded[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&encoded[2..]);
    out
}

// =========================================================================
// Source files and sessions
// =========================================================================

/// A JPEG-named source whose bytes follow the mock renderer convention.
pub fn mock_file(name: &str) -> SourceFile {
    SourceFile::new(name, mock_source(4000, 3000, name), Some("image/jpeg"))
}

/// A batch of [`mock_file`]s in the given order.
pub fn mock_batch(names: &[&str]) -> Vec<SourceFile> {
    names.iter().map(|n| mock_file(n)).collect()
}

/// Config with no cooperative delay, so async tests run quickly.
pub fn fast_config() -> CullConfig {
    let mut config = CullConfig::default();
    config.preview.fill_delay_ms = 0;
    config.preview.progress_every = 1;
    config
}

/// A preview cache over the given mock renderer with [`fast_config`] settings.
pub fn cache_with_mock(renderer: MockRenderer) -> PreviewCache {
    PreviewCache::new(Arc::new(renderer), fast_config().preview_settings())
}

/// A session over the given mock renderer with [`fast_config`] settings.
pub fn session_with_mock(renderer: MockRenderer) -> CullingSession {
    let config = fast_config();
    CullingSession::new(cache_with_mock(renderer), config.culling_settings())
}

/// File names in order, for compact assertions.
pub fn names(files: &[SourceFile]) -> Vec<&str> {
    files.iter().map(|f| f.name.as_str()).collect()
}
