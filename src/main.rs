use clap::{Parser, Subcommand};
use photocull::config::{self, CullConfig, ExportConfig};
use photocull::export::local::{FsDirectoryPicker, FsDownloader};
use photocull::export::{Capabilities, ChannelKind, ExportCoordinator, ExportEvent, ExportJob};
use photocull::imaging::{ImageRenderer, JpegRenderer, RenderTarget, render_async};
use photocull::preview::{FillEvent, PreviewCache};
use photocull::repl::{self, ReplCommand};
use photocull::session::{CullingSession, Intent};
use photocull::types::Mode;
use photocull::{import, metadata, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "photocull")]
#[command(about = "Cull a batch of JPEGs and export the keepers")]
#[command(long_about = "\
Cull a batch of JPEGs and export the keepers

Import a folder of camera JPEGs, rate each photo 1-5 stars, filter and select
the ones worth keeping, then export the selection as a zip archive or into a
folder, resized and re-encoded on the way out.

Typical session:

  photocull cull ~/Pictures/2024-05-shoot
  > 5            rate the current photo, moves on by itself
  > n / p        next / previous
  > r            review: filter and select
  > f 5          show only 5-star photos
  > a            select all of them
  > export       write exports/Selection.zip

Previews are rendered in the background while you cull. Set RUST_LOG=debug
for detailed logs. Run 'photocull gen-config' for a documented photocull.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./photocull.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cull files or folders of JPEGs interactively
    Cull {
        /// JPEG files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Where archives and folder exports are written
        #[arg(long, default_value = "exports")]
        out: PathBuf,
    },
    /// Render one file the way an export would
    Render {
        file: PathBuf,
        /// Longer edge in px, or "original"
        #[arg(long)]
        resolution: Option<RenderTarget>,
        /// JPEG quality, 1-100
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        quality: Option<u32>,
        /// Output path (default: <stem>-<resolution>.jpg next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the camera metadata line for a JPEG
    Info { file: PathBuf },
    /// Print a stock photocull.toml with all options documented
    GenConfig,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photocull=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    let load = || -> CliResult<CullConfig> {
        let cwd = std::env::current_dir()?;
        Ok(config::load_config(cli.config.as_deref(), &cwd)?)
    };

    match &cli.command {
        Command::Cull { paths, out } => {
            let config = load()?;
            CullLoop::new(&config, out).run(paths).await?;
        }
        Command::Render {
            file,
            resolution,
            quality,
            output,
        } => {
            let config = load()?;
            let target = resolution.unwrap_or(config.export.resolution);
            let quality = quality
                .map(photocull::imaging::Quality::from_percent)
                .unwrap_or(config.export.quality);
            let renderer: Arc<dyn ImageRenderer> = Arc::new(JpegRenderer::new());
            let bytes = std::fs::read(file)?;
            let rendered = render_async(renderer.clone(), bytes.into(), target, quality).await?;

            let dest = output.clone().unwrap_or_else(|| default_render_path(file, target));
            std::fs::write(&dest, &rendered)?;
            let dims = renderer.identify(&rendered)?;
            println!(
                "{} \u{2192} {} ({}x{})",
                file.display(),
                dest.display(),
                dims.width,
                dims.height
            );
        }
        Command::Info { file } => {
            let bytes = std::fs::read(file)?;
            match metadata::read_summary(&JpegRenderer::new(), &bytes) {
                Some(summary) => println!("{}", summary.display_line()),
                None => println!("{}", metadata::NO_METADATA),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn default_render_path(file: &Path, target: RenderTarget) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "render".to_string());
    file.with_file_name(format!("{stem}-{target}.jpg"))
}

/// The interactive culling loop: stdin lines in, view lines out.
struct CullLoop {
    renderer: Arc<dyn ImageRenderer>,
    session: CullingSession,
    exporter: ExportCoordinator,
    form: ExportConfig,
    fill_events: UnboundedReceiver<FillEvent>,
    export_events: UnboundedReceiver<ExportEvent>,
}

impl CullLoop {
    fn new(config: &CullConfig, out: &Path) -> Self {
        let renderer: Arc<dyn ImageRenderer> = Arc::new(JpegRenderer::new());

        let previews = PreviewCache::new(renderer.clone(), config.preview_settings());
        let (fill_tx, fill_events) = mpsc::unbounded_channel();
        previews.set_event_sender(fill_tx);
        let session = CullingSession::new(previews, config.culling_settings());

        // A terminal has no share sheet; folder exports land under `out`.
        let capabilities = Capabilities::new(true)
            .with_downloader(Arc::new(FsDownloader::new(out)))
            .with_directory_picker(Arc::new(FsDirectoryPicker::new(out)));
        let mut exporter = ExportCoordinator::new(renderer.clone(), capabilities);
        let (export_tx, export_events) = mpsc::unbounded_channel();
        exporter.set_event_sender(export_tx);

        Self {
            renderer,
            session,
            exporter,
            form: config.export.clone(),
            fill_events,
            export_events,
        }
    }

    async fn run(mut self, paths: &[PathBuf]) -> CliResult<()> {
        self.import(paths);
        self.show().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let deadline = self.session.pending_advance_deadline();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match repl::parse_line(&line) {
                        Ok(ReplCommand::Quit) => break,
                        Ok(command) => self.handle(command).await,
                        Err(e) => println!("{e}"),
                    }
                }
                _ = sleep_until(deadline) => {
                    if self.session.apply_due_advance(Instant::now()) {
                        self.show().await;
                    }
                }
                Some(event) = self.fill_events.recv() => output::print_fill_event(&event),
            }
        }
        Ok(())
    }

    fn import(&mut self, paths: &[PathBuf]) {
        let sources = match import::collect_sources(paths) {
            Ok(sources) => sources,
            Err(e) => {
                println!("Import failed: {e}");
                return;
            }
        };
        match self.session.import_files(sources) {
            Ok(count) => println!("Imported {count} photos"),
            Err(e) => println!("{e}"),
        }
    }

    async fn show(&self) {
        if self.session.mode() == Mode::ReviewExport {
            output::print_grid(&self.session);
            return;
        }
        let exif = self
            .session
            .current_file()
            .and_then(|f| metadata::read_summary(self.renderer.as_ref(), &f.bytes));
        output::print_view(&self.session.view(), exif.as_ref());
        if let Some(preview) = self.session.current_preview().await {
            println!("{}", output::format_preview(&preview));
        }
    }

    async fn handle(&mut self, command: ReplCommand) {
        match command {
            ReplCommand::Intent(intent) => {
                let refresh = !matches!(intent, Intent::Pan { .. });
                if let Err(e) = self.session.apply(intent) {
                    println!("{e}");
                } else if refresh {
                    self.show().await;
                }
            }
            ReplCommand::Pinch(scale) if self.session.mode() == Mode::Culling => {
                self.session.pinch_zoom(scale);
            }
            ReplCommand::Release if self.session.mode() == Mode::Culling => {
                self.session.end_pinch();
                self.show().await;
            }
            ReplCommand::Pinch(_) | ReplCommand::Release => {}
            ReplCommand::Grid => output::print_grid(&self.session),
            ReplCommand::Show => self.show().await,
            ReplCommand::Json => match serde_json::to_string_pretty(&self.session.view()) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{e}"),
            },
            ReplCommand::Import(paths) => {
                self.import(&paths);
                self.show().await;
            }
            ReplCommand::Export => self.export().await,
            ReplCommand::Channels => {
                let channels: Vec<_> = ChannelKind::ALL
                    .iter()
                    .map(|&kind| (kind, self.exporter.channel_availability(kind)))
                    .collect();
                for line in output::format_channel_availability(&channels) {
                    println!("{line}");
                }
            }
            ReplCommand::Pick => match self.exporter.pick_directory().await {
                Ok(true) => println!(
                    "Export directory: {}",
                    self.exporter.granted_directory().unwrap_or_default()
                ),
                Ok(false) => println!("No directory chosen"),
                Err(e) => println!("{e}"),
            },
            ReplCommand::Forget => {
                self.exporter.forget_directory();
                println!("Export directory forgotten");
            }
            ReplCommand::SetChannel(channel) => {
                let availability = self.exporter.channel_availability(channel);
                self.form.channel = channel;
                println!("channel: {channel}");
                if let Some(hint) = availability.hint(channel) {
                    println!("    {hint}");
                }
            }
            ReplCommand::SetResolution(target) => {
                self.form.resolution = target;
                println!("resolution: {target}");
            }
            ReplCommand::SetQuality(quality) => {
                self.form.quality = quality;
                println!("quality: {}", quality.encoder_value());
            }
            ReplCommand::SetDestination(name) => {
                println!("destination: {name}");
                self.form.destination = name;
            }
            ReplCommand::Reset => {
                self.session.reset();
                self.show().await;
            }
            ReplCommand::Help => println!("{}", repl::HELP),
            ReplCommand::Quit => {}
        }
    }

    async fn export(&mut self) {
        let job = ExportJob::from_session(&self.session, &self.form);
        let result = {
            let export = self.exporter.export(job);
            tokio::pin!(export);
            loop {
                tokio::select! {
                    result = &mut export => break result,
                    Some(event) = self.export_events.recv() => output::print_export_event(&event),
                }
            }
        };
        while let Ok(event) = self.export_events.try_recv() {
            output::print_export_event(&event);
        }
        match result {
            Ok(outcome) => output::print_export_outcome(&outcome),
            Err(e) => println!("Export failed: {e}"),
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
