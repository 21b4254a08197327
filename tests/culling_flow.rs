//! End-to-end culling passes through the public API with the real JPEG
//! renderer and the filesystem channels the CLI uses.
//!
//! Run with: cargo test --test culling_flow

use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, RgbImage};
use photocull::config::ExportConfig;
use photocull::export::local::{FsDirectoryPicker, FsDownloader};
use photocull::export::{
    Capabilities, ChannelKind, ExportCoordinator, ExportError, ExportJob, ExportOutcome,
};
use photocull::imaging::{ImageRenderer, JpegRenderer, Quality, RenderTarget};
use photocull::import::collect_sources;
use photocull::preview::{FillOutcome, PreviewCache, PreviewKind, PreviewSettings};
use photocull::session::{CullingSession, CullingSettings, Intent};
use photocull::types::Mode;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode_image(&img)
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn renderer() -> Arc<dyn ImageRenderer> {
    Arc::new(JpegRenderer::new())
}

fn session(renderer: Arc<dyn ImageRenderer>) -> CullingSession {
    let settings = PreviewSettings {
        max_dimension: 64,
        quality: Quality::from_percent(70),
        fill_delay: Duration::ZERO,
        progress_every: 1,
    };
    CullingSession::new(
        PreviewCache::new(renderer, settings),
        CullingSettings::default(),
    )
}

/// a: 5 stars, b: unrated, c: 3 stars, plus a raw file the import ignores.
fn shoot(dir: &Path) {
    write_jpeg(&dir.join("a.jpg"), 300, 200);
    write_jpeg(&dir.join("b.jpg"), 200, 300);
    write_jpeg(&dir.join("c.jpeg"), 120, 80);
    std::fs::write(dir.join("a.cr3"), b"raw sensor data").unwrap();
}

fn rate_shoot(session: &mut CullingSession) {
    session.apply(Intent::SetRating(5)).unwrap();
    session.apply(Intent::Next).unwrap();
    session.apply(Intent::Next).unwrap();
    session.apply(Intent::SetRating(3)).unwrap();
}

fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

#[tokio::test]
async fn import_rate_select_and_export_archive() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("shoot");
    let out = tmp.path().join("exports");
    std::fs::create_dir_all(&content).unwrap();
    shoot(&content);

    let renderer = renderer();
    let mut session = session(renderer.clone());
    let imported = session
        .import_files(collect_sources(&[content]).unwrap())
        .unwrap();
    assert_eq!(imported, 3);
    assert_eq!(session.mode(), Mode::Culling);

    let fill = session.take_fill_handle().expect("fill spawned inside runtime");
    assert_eq!(
        fill.await.unwrap(),
        Some(FillOutcome::Completed {
            rendered: 3,
            fallbacks: 0
        })
    );
    let preview = session.current_preview().await.unwrap();
    assert_eq!(preview.kind, PreviewKind::Rendered);
    let dims = renderer.identify(&preview.bytes).unwrap();
    assert_eq!((dims.width, dims.height), (64, 43));

    rate_shoot(&mut session);
    session.apply(Intent::Advance).unwrap();
    assert_eq!(session.mode(), Mode::ReviewExport);
    session.apply(Intent::SetFilter(0)).unwrap();
    session.apply(Intent::ToggleSelectAll).unwrap();
    assert_eq!(session.selection_count(), 2);

    let caps = Capabilities::new(true).with_downloader(Arc::new(FsDownloader::new(&out)));
    let mut exporter = ExportCoordinator::new(renderer.clone(), caps);
    let form = ExportConfig {
        resolution: RenderTarget::MaxDimension(100),
        ..ExportConfig::default()
    };
    let outcome = exporter
        .export(ExportJob::from_session(&session, &form))
        .await
        .unwrap();

    let ExportOutcome::Delivered(summary) = outcome else {
        panic!("archive export is never cancelled");
    };
    assert_eq!(summary.delivered, 2);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.destination, "Selection.zip");

    let entries = zip_entries(&std::fs::read(out.join("Selection.zip")).unwrap());
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "c.jpeg"]);

    // a is 300x200, fitted to 100; c is 120x80, fitted to 100.
    let a = image::load_from_memory(&entries[0].1).unwrap();
    let c = image::load_from_memory(&entries[1].1).unwrap();
    assert_eq!(a.dimensions(), (100, 67));
    assert_eq!(c.dimensions(), (100, 67));
}

#[tokio::test]
async fn folder_export_writes_into_destination_subfolder() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("shoot");
    let out = tmp.path().join("exports");
    std::fs::create_dir_all(&content).unwrap();
    shoot(&content);

    let renderer = renderer();
    let mut session = session(renderer.clone());
    session
        .import_files(collect_sources(&[content]).unwrap())
        .unwrap();
    rate_shoot(&mut session);
    session.apply(Intent::SetFilter(5)).unwrap();
    session.apply(Intent::ToggleSelectAll).unwrap();

    let caps = Capabilities::new(true).with_directory_picker(Arc::new(FsDirectoryPicker::new(&out)));
    let mut exporter = ExportCoordinator::new(renderer.clone(), caps);
    assert!(exporter.pick_directory().await.unwrap());

    let form = ExportConfig {
        resolution: RenderTarget::Original,
        destination: "Keepers".into(),
        channel: ChannelKind::Folder,
        ..ExportConfig::default()
    };
    let outcome = exporter
        .export(ExportJob::from_session(&session, &form))
        .await
        .unwrap();
    let ExportOutcome::Delivered(summary) = outcome else {
        panic!("the filesystem picker never prompts");
    };
    assert_eq!(summary.delivered, 1);

    let written = std::fs::read(out.join("Keepers").join("a.jpg")).unwrap();
    let img = image::load_from_memory(&written).unwrap();
    assert_eq!(img.dimensions(), (300, 200));
    assert!(!out.join("Keepers").join("c.jpeg").exists());
}

#[tokio::test]
async fn reimport_keeps_ratings_for_surviving_names_only() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");
    std::fs::create_dir_all(&first).unwrap();
    std::fs::create_dir_all(&second).unwrap();
    shoot(&first);
    write_jpeg(&second.join("a.jpg"), 40, 40);
    write_jpeg(&second.join("d.jpg"), 40, 40);

    let renderer = renderer();
    let mut session = session(renderer.clone());
    session
        .import_files(collect_sources(&[first]).unwrap())
        .unwrap();
    rate_shoot(&mut session);
    session.apply(Intent::ToggleSelection("c.jpeg".into())).unwrap();

    session
        .import_files(collect_sources(&[second]).unwrap())
        .unwrap();
    assert_eq!(session.rating_of("a.jpg"), 5);
    assert_eq!(session.rating_of("c.jpeg"), 0);
    assert_eq!(session.selection_count(), 0);

    // Previews come from the new batch, never the old "a.jpg".
    let fill = session.take_fill_handle().unwrap();
    fill.await.unwrap();
    let preview = session.current_preview().await.unwrap();
    let dims = renderer.identify(&preview.bytes).unwrap();
    assert_eq!((dims.width, dims.height), (40, 40));
}

#[tokio::test]
async fn export_preconditions_fail_before_rendering() {
    let renderer = renderer();
    let session = session(renderer.clone());
    let mut exporter = ExportCoordinator::new(renderer, Capabilities::new(true));

    let err = exporter
        .export(ExportJob::from_session(&session, &ExportConfig::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::EmptySelection));
}
