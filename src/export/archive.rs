//! Zip packaging for the archive channel.
//!
//! Entries sit at the archive root under the photo's own file name; there is
//! never a subfolder. Names are checked per file by the coordinator before
//! rendering, so a nested or repeated name never reaches the writer. Packaging
//! is CPU-bound and runs on the blocking pool.

use super::ExportError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// `<destination>.zip`
pub fn archive_file_name(destination: &str) -> String {
    format!("{destination}.zip")
}

fn zip_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::ChannelIo(format!("archive: {e}"))
}

/// Build an in-memory zip holding `entries` in order.
pub fn build_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        writer.write_all(bytes)?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

/// [`build_archive`] on the blocking pool.
pub async fn build_archive_async(entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, ExportError> {
    tokio::task::spawn_blocking(move || build_archive(&entries))
        .await
        .map_err(zip_error)?
}
