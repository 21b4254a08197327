//! Parameter types for image operations.
//!
//! These types describe *what* to render, not *how*. They sit between the
//! high-level [`operations`](super::operations) (which decide the output size)
//! and the [`backend`](super::backend) (which does the pixel work), so a mock
//! renderer can stand in for the real one in tests.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality as a fraction in `(0, 1]`.
//! - [`RenderTarget`]: either the untouched original or a bound on the longer edge.
//! - [`ResizeParams`]: exact output dimensions plus quality for one re-encode.

use super::backend::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JPEG encoding quality in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Result<Self, RenderError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(RenderError::InvalidQuality(value))
        }
    }

    /// Build from a 1-100 percentage, clamping out-of-range input.
    pub fn from_percent(percent: u32) -> Self {
        Self(percent.clamp(1, 100) as f32 / 100.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the encoder's 1-100 scale.
    pub fn encoder_value(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.9)
    }
}

impl TryFrom<f32> for Quality {
    type Error = RenderError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for f32 {
    fn from(q: Quality) -> f32 {
        q.0
    }
}

/// Output size for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "RawTarget")]
pub enum RenderTarget {
    /// Pass the source through untouched.
    Original,
    /// Bound the longer edge; smaller sources are never upscaled.
    MaxDimension(u32),
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::Original => write!(f, "original"),
            RenderTarget::MaxDimension(px) => write!(f, "{px}px"),
        }
    }
}

impl FromStr for RenderTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("original") {
            return Ok(RenderTarget::Original);
        }
        let px = s
            .trim_end_matches("px")
            .parse::<u32>()
            .map_err(|_| format!("expected a pixel size or \"original\", got {s:?}"))?;
        if px == 0 {
            return Err("resolution must be greater than zero".into());
        }
        Ok(RenderTarget::MaxDimension(px))
    }
}

/// Config files may say `resolution = 2048` or `resolution = "original"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Pixels(u32),
    Keyword(String),
}

impl TryFrom<RawTarget> for RenderTarget {
    type Error = String;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        match raw {
            RawTarget::Pixels(0) => Err("resolution must be greater than zero".into()),
            RawTarget::Pixels(px) => Ok(RenderTarget::MaxDimension(px)),
            RawTarget::Keyword(s) => s.parse(),
        }
    }
}

impl From<RenderTarget> for RawTarget {
    fn from(target: RenderTarget) -> Self {
        match target {
            RenderTarget::Original => RawTarget::Keyword("original".into()),
            RenderTarget::MaxDimension(px) => RawTarget::Pixels(px),
        }
    }
}

/// Exact output size for one resize + re-encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
