//! # photocull
//!
//! Rate, filter, select and export a batch of camera JPEGs. A culling
//! session moves through three modes:
//!
//! ```text
//! 1. Import         files      →  batch          (JPEGs only, duplicates dropped)
//! 2. Culling        batch      →  ratings        (one photo at a time, 0-5 stars)
//! 3. Review/Export  ratings    →  selection      (filter, select, export)
//! ```
//!
//! While the user culls, a background task renders a downscaled preview of
//! every photo so navigation never waits on a full-size decode. Exports
//! re-render the selection at the chosen resolution and quality and deliver it
//! through one of three channels: a zip archive, a granted folder, or a share
//! target.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Mode state machine, ratings, cursor, zoom/pan, filter and selection |
//! | [`preview`] | Preview cache with a background fill that stops on reimport |
//! | [`export`] | Export coordinator and the archive / folder / share channels |
//! | [`imaging`] | Pure-Rust image operations: identify, EXIF, render to JPEG |
//! | [`metadata`] | Camera summary line (model, ISO, aperture, shutter) from EXIF |
//! | [`config`] | `photocull.toml` loading and validation |
//! | [`import`] | Collecting import batches from files and directories |
//! | [`repl`] | Line commands for the interactive `cull` loop |
//! | [`types`] | Shared types (`SourceFile`, `Mode`, `ViewCursor`) |
//! | [`output`] | CLI output formatting for views, progress and exports |
//!
//! # Design Decisions
//!
//! ## Epoch-Guarded Previews
//!
//! Every import bumps the cache epoch. A fill task captures the epoch when it
//! starts and checks it under the cache lock before each write, so a render
//! that finishes after a reimport is dropped instead of showing a photo from
//! the previous batch under a reused file name.
//!
//! ## Platform Capabilities as Traits
//!
//! Export channels talk to the platform through [`export::Downloader`],
//! [`export::DirectoryPicker`] and [`export::ShareTarget`]. The CLI wires in
//! filesystem implementations; tests wire in in-memory ones. A channel whose
//! capability is missing reports why instead of failing halfway through.
//!
//! ## Renders Off the Runtime Threads
//!
//! Decoding and encoding are CPU-bound, so [`imaging::render_async`] runs them
//! on tokio's blocking pool. Session state never crosses an `.await` while a
//! lock is held.

pub mod config;
pub mod export;
pub mod imaging;
pub mod import;
pub mod metadata;
pub mod output;
pub mod preview;
pub mod repl;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
