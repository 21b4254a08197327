//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `source` inside a square of `max_dimension` on the longer edge.
///
/// Aspect ratio is preserved and the result never exceeds the source: an
/// image already within bounds comes back unchanged. The shorter edge is
/// rounded and never collapses below one pixel.
///
/// # Examples
/// ```
/// # use photocull::imaging::fit_within;
/// // 4000x3000 landscape bounded to 1280 → 1280x960
/// assert_eq!(fit_within((4000, 3000), 1280), (1280, 960));
///
/// // Already small enough → untouched
/// assert_eq!(fit_within((800, 600), 1280), (800, 600));
/// ```
pub fn fit_within(source: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let longer_edge = src_w.max(src_h);

    if max_dimension == 0 || longer_edge <= max_dimension {
        return source;
    }

    let ratio = max_dimension as f64 / longer_edge as f64;
    if src_w >= src_h {
        // Landscape or square
        let h = ((src_h as f64 * ratio).round() as u32).max(1);
        (max_dimension, h)
    } else {
        // Portrait
        let w = ((src_w as f64 * ratio).round() as u32).max(1);
        (w, max_dimension)
    }
}
