//! Pure Rust JPEG renderer built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageDecoder::dimensions` + `orientation` (header only) |
//! | Decode | `DynamicImage::from_decoder` with format sniffing |
//! | Orient | `DynamicImage::apply_orientation` from the EXIF Orientation tag |
//! | Flatten | alpha composited onto opaque black |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | EXIF | custom `exif_parser` (JPEG APP1 + TIFF IFD) |

use super::backend::{Dimensions, ExifData, ImageRenderer, RenderError};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, Rgb, RgbImage,
};
use std::io::Cursor;

/// Pure Rust renderer producing baseline JPEGs.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct JpegRenderer;

impl JpegRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JpegRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, RenderError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode(format!("Failed to sniff format: {e}")))
}

fn decoder(source: &[u8]) -> Result<impl ImageDecoder + '_, RenderError> {
    reader(source)?
        .into_decoder()
        .map_err(|e| RenderError::Decode(e.to_string()))
}

/// EXIF orientation, or none when the tag is missing or unreadable.
fn orientation_of(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode an in-memory image of any compiled-in format, upright.
///
/// Re-encoding drops the EXIF block, so the orientation has to be baked into
/// the pixels here.
fn load_image(source: &[u8]) -> Result<DynamicImage, RenderError> {
    let mut decoder = decoder(source)?;
    let orientation = orientation_of(&mut decoder);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| RenderError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Drop the alpha channel by compositing onto black.
///
/// JPEG has no alpha; converting straight to RGB would leave whatever colour
/// sits under transparent pixels.
fn flatten_onto_black(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Encode RGB pixels as a JPEG at the given 1-100 quality.
fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buf)
}

impl ImageRenderer for JpegRenderer {
    /// Dimensions as displayed, i.e. after EXIF orientation.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, RenderError> {
        let mut decoder = decoder(source)?;
        let (width, height) = decoder.dimensions();
        if swaps_axes(orientation_of(&mut decoder)) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn read_metadata(&self, source: &[u8]) -> ExifData {
        super::exif_parser::read_exif(source)
    }

    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, RenderError> {
        let img = flatten_onto_black(load_image(source)?);
        let resized = if img.dimensions() == (params.width, params.height) {
            img
        } else {
            image::imageops::resize(&img, params.width, params.height, FilterType::Lanczos3)
        };
        encode_jpeg(&resized, params.quality.encoder_value())
    }
}
