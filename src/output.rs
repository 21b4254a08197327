//! CLI output formatting for the culling REPL and one-shot commands.
//!
//! # Output Format
//!
//! ## Viewer
//!
//! ```text
//! Cull (2/5) • 40%
//!     b.jpg ★★★☆☆
//!     EOS R5 • ISO 400 • f/2.8 • 1/250s
//!     zoom 2.5x, pan (10, -4)
//! ```
//!
//! ## Review grid
//!
//! ```text
//! Review (filter: rated, 2 shown, 1 selected)
//! 002 [x] b.jpg ★★★★★
//! 003 [ ] c.jpg ★★★☆☆
//! ```
//!
//! ## Export
//!
//! ```text
//! Exporting 2 photos via archive
//!     1/2
//!     2/2
//!     Packaging 2 photos
//! Delivered 2 photos → Selection.zip
//! ```
//!
//! # Architecture
//!
//! Every display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::export::{ChannelAvailability, ChannelKind, ExportEvent, ExportOutcome};
use crate::metadata::{ExifSummary, NO_METADATA};
use crate::preview::{FillEvent, FillOutcome, Preview, PreviewKind};
use crate::session::{CullingSession, MAX_RATING, SessionView};
use crate::types::Mode;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `★★★☆☆` for a rating of 3.
pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "photo" } else { "photos" }
}

fn filter_label(filter: u8) -> String {
    match filter {
        0 => "rated".to_string(),
        n => format!("★{n}"),
    }
}

// ============================================================================
// Session views
// ============================================================================

/// Format the single-photo viewer, or the header of the other screens.
pub fn format_view(view: &SessionView, exif: Option<&ExifSummary>) -> Vec<String> {
    let mut lines = vec![view.title.clone()];
    match view.mode {
        Mode::Import => lines.push(format!("{}Import JPEG files to start culling.", indent(1))),
        Mode::Culling => {
            if let Some(name) = &view.current {
                lines.push(format!("{}{} {}", indent(1), name, stars(view.rating)));
            }
            lines.push(format!(
                "{}{}",
                indent(1),
                exif.map_or_else(|| NO_METADATA.to_string(), ExifSummary::display_line)
            ));
            if view.zoom > 1.0 {
                lines.push(format!(
                    "{}zoom {}x, pan ({}, {})",
                    indent(1),
                    view.zoom,
                    view.pan.0,
                    view.pan.1
                ));
            }
        }
        Mode::ReviewExport => lines.push(format!(
            "{}{} of {} shown, {} selected",
            indent(1),
            view.filtered,
            view.total,
            view.selected
        )),
    }
    lines
}

/// Format the review grid: the filtered files with rating and selection.
pub fn format_grid(session: &CullingSession) -> Vec<String> {
    let view = session.view();
    let mut lines = vec![format!(
        "Review (filter: {}, {} shown, {} selected)",
        filter_label(view.filter),
        view.filtered,
        view.selected
    )];
    if let Some(message) = &view.empty_message {
        lines.push(format!("{}{}", indent(1), message));
        return lines;
    }

    for (pos, file) in session.files().iter().enumerate() {
        if !session.passes_filter(&file.name) {
            continue;
        }
        let rating = session.rating_of(&file.name);
        let mark = if session.is_selected(&file.name) { "[x]" } else { "[ ]" };
        lines.push(format!(
            "{} {} {} {}",
            format_index(pos + 1),
            mark,
            file.name,
            stars(rating)
        ));
    }
    lines
}

/// Size line for the preview being shown.
pub fn format_preview(preview: &Preview) -> String {
    let label = match preview.kind {
        PreviewKind::Rendered => "preview",
        PreviewKind::Original => "original (preview failed)",
    };
    format!("{}{} {} KiB", indent(1), label, preview.bytes.len().div_ceil(1024))
}

pub fn print_view(view: &SessionView, exif: Option<&ExifSummary>) {
    for line in format_view(view, exif) {
        println!("{}", line);
    }
}

pub fn print_grid(session: &CullingSession) {
    for line in format_grid(session) {
        println!("{}", line);
    }
}

// ============================================================================
// Background fill
// ============================================================================

pub fn format_fill_event(event: &FillEvent) -> Vec<String> {
    match event {
        FillEvent::Progress { cached, total, .. } => {
            vec![format!("{}previews {}/{}", indent(1), cached, total)]
        }
        FillEvent::Finished { outcome, .. } => match outcome {
            FillOutcome::Completed {
                rendered,
                fallbacks: 0,
            } => vec![format!("{}previews ready ({} rendered)", indent(1), rendered)],
            FillOutcome::Completed {
                rendered,
                fallbacks,
            } => vec![format!(
                "{}previews ready ({} rendered, {} shown as original)",
                indent(1),
                rendered,
                fallbacks
            )],
            FillOutcome::Superseded { .. } => Vec::new(),
        },
    }
}

pub fn print_fill_event(event: &FillEvent) {
    for line in format_fill_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::ChannelStarted { channel, total } => {
            vec![format!("Exporting {} {} via {}", total, plural(*total), channel)]
        }
        ExportEvent::Progress { current, total } => {
            vec![format!("{}{}/{}", indent(1), current, total)]
        }
        ExportEvent::FileFailed { name, reason } => {
            vec![format!("{}skipped {}: {}", indent(1), name, reason)]
        }
        ExportEvent::Packaging { files } => {
            vec![format!("{}Packaging {} {}", indent(1), files, plural(*files))]
        }
    }
}

pub fn format_export_outcome(outcome: &ExportOutcome) -> Vec<String> {
    match outcome {
        ExportOutcome::Cancelled => vec!["Export cancelled. Nothing was written.".to_string()],
        ExportOutcome::Delivered(summary) => {
            let mut lines = vec![format!(
                "Delivered {} {} \u{2192} {}",
                summary.delivered,
                plural(summary.delivered),
                summary.destination
            )];
            if !summary.failed.is_empty() {
                lines.push(format!(
                    "{}{} skipped: {}",
                    indent(1),
                    summary.failed.len(),
                    summary.failed.join(", ")
                ));
            }
            lines
        }
    }
}

/// One line per channel, with the hint for unavailable ones.
pub fn format_channel_availability(
    channels: &[(ChannelKind, ChannelAvailability)],
) -> Vec<String> {
    channels
        .iter()
        .map(|(kind, availability)| match availability.hint(*kind) {
            None => format!("{:<8} available", kind.to_string()),
            Some(hint) => format!("{:<8} {}", kind.to_string(), hint),
        })
        .collect()
}

pub fn print_export_event(event: &ExportEvent) {
    for line in format_export_event(event) {
        println!("{}", line);
    }
}

pub fn print_export_outcome(outcome: &ExportOutcome) {
    for line in format_export_outcome(outcome) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportSummary;
    use crate::imaging::backend::tests::MockRenderer;
    use crate::test_helpers::{mock_batch, session_with_mock};

    fn session() -> CullingSession {
        let mut session = session_with_mock(MockRenderer::new());
        session
            .import_files(mock_batch(&["a.jpg", "b.jpg", "c.jpg"]))
            .unwrap();
        session
    }

    #[test]
    fn stars_fill_from_left() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn viewer_shows_rating_and_metadata_fallback() {
        let mut s = session();
        s.set_rating(4).unwrap();
        let lines = format_view(&s.view(), None);
        assert_eq!(lines[0], "Cull (1/3)");
        assert_eq!(lines[1], "    a.jpg ★★★★☆");
        assert_eq!(lines[2], format!("    {}", NO_METADATA));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn viewer_shows_zoom_when_magnified() {
        let mut s = session();
        s.toggle_zoom();
        s.pan(10.0, -4.0);
        let lines = format_view(&s.view(), None);
        assert_eq!(lines.last().unwrap(), "    zoom 2.5x, pan (10, -4)");
    }

    #[test]
    fn grid_lists_filtered_files_with_marks() {
        let mut s = session();
        s.navigate(1);
        s.set_rating(5).unwrap();
        s.navigate(1);
        s.set_rating(3).unwrap();
        s.toggle_selection("b.jpg");

        assert_eq!(
            format_grid(&s),
            vec![
                "Review (filter: rated, 2 shown, 1 selected)",
                "002 [x] b.jpg ★★★★★",
                "003 [ ] c.jpg ★★★☆☆",
            ]
        );
    }

    #[test]
    fn grid_empty_message() {
        let mut s = session();
        s.set_filter(2).unwrap();
        assert_eq!(
            format_grid(&s),
            vec![
                "Review (filter: ★2, 0 shown, 0 selected)",
                "    No ★2 photos.",
            ]
        );
    }

    #[test]
    fn export_events_format() {
        assert_eq!(
            format_export_event(&ExportEvent::ChannelStarted {
                channel: ChannelKind::Folder,
                total: 1
            }),
            vec!["Exporting 1 photo via folder"]
        );
        assert_eq!(
            format_export_event(&ExportEvent::Progress { current: 2, total: 5 }),
            vec!["    2/5"]
        );
    }

    #[test]
    fn outcome_lists_skipped_files() {
        let outcome = ExportOutcome::Delivered(ExportSummary {
            delivered: 2,
            failed: vec!["b.jpg".into()],
            destination: "Selection.zip".into(),
        });
        assert_eq!(
            format_export_outcome(&outcome),
            vec!["Delivered 2 photos → Selection.zip", "    1 skipped: b.jpg"]
        );
    }

    #[test]
    fn fill_events_format() {
        let lines = format_fill_event(&FillEvent::Finished {
            epoch: 1,
            outcome: FillOutcome::Completed {
                rendered: 4,
                fallbacks: 1,
            },
        });
        assert_eq!(lines, vec!["    previews ready (4 rendered, 1 shown as original)"]);
        let superseded = FillEvent::Finished {
            epoch: 1,
            outcome: FillOutcome::Superseded { rendered: 2 },
        };
        assert!(format_fill_event(&superseded).is_empty());
    }

    #[test]
    fn preview_line_reports_kind_and_size() {
        let preview = Preview {
            bytes: vec![0u8; 2049].into(),
            kind: PreviewKind::Original,
        };
        assert_eq!(format_preview(&preview), "    original (preview failed) 3 KiB");
    }

    #[test]
    fn availability_lines_carry_hints() {
        let lines = format_channel_availability(&[
            (ChannelKind::Archive, ChannelAvailability::Available),
            (ChannelKind::Share, ChannelAvailability::Unsupported),
        ]);
        assert_eq!(lines[0], "archive  available");
        assert!(lines[1].starts_with("share    This platform cannot share"));
    }
}
