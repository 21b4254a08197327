//! Shared types passed between the session, preview cache and exporter.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An imported photo: a unique name plus its immutable bytes.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub content_type: Option<String>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        content_type: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            content_type: content_type.map(str::to_string),
        }
    }

    /// Whether this file qualifies for import.
    ///
    /// Either the declared type is a JPEG image, or the name ends in
    /// `.jpg`/`.jpeg` (case-insensitive).
    pub fn is_jpeg(&self) -> bool {
        let declared = self.content_type.as_deref().is_some_and(|t| {
            t.eq_ignore_ascii_case("image/jpeg") || t.eq_ignore_ascii_case("image/jpg")
        });
        let lower = self.name.to_ascii_lowercase();
        declared || lower.ends_with(".jpg") || lower.ends_with(".jpeg")
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Import,
    Culling,
    ReviewExport,
}

/// Cursor into the full file list plus the viewer's zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewCursor {
    pub index: usize,
    pub zoom: f32,
    pub pan: (f32, f32),
}

impl Default for ViewCursor {
    fn default() -> Self {
        Self {
            index: 0,
            zoom: 1.0,
            pan: (0.0, 0.0),
        }
    }
}

impl ViewCursor {
    /// Fit-to-screen at `index`, pan at the origin.
    pub fn at(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: Option<&str>) -> SourceFile {
        SourceFile::new(name, b"x".to_vec(), content_type)
    }

    #[test]
    fn jpeg_by_extension_any_case() {
        assert!(file("a.jpg", None).is_jpeg());
        assert!(file("B.JPEG", None).is_jpeg());
        assert!(file("c.JpG", Some("application/octet-stream")).is_jpeg());
    }

    #[test]
    fn jpeg_by_declared_type() {
        assert!(file("export", Some("image/jpeg")).is_jpeg());
        assert!(file("export", Some("IMAGE/JPEG")).is_jpeg());
    }

    #[test]
    fn rejects_other_formats() {
        assert!(!file("a.png", Some("image/png")).is_jpeg());
        assert!(!file("a.cr3", None).is_jpeg());
        assert!(!file("jpg", None).is_jpeg());
    }

    #[test]
    fn debug_hides_bytes() {
        let f = file("a.jpg", None);
        assert!(format!("{f:?}").contains("bytes: 1"));
    }
}
