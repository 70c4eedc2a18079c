use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pathfiddle_document::{Document, Encoding, decode, sample_document};
use pathfiddle_harness::{FrameController, HarnessArgs, HostEvent, create_backend};
use pathfiddle_render::{CountingFactory, HeadlessSurface};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathfiddle-cli", about = "Headless pathfiddle tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Write the built-in demo document
    Sample {
        /// Output path
        output: PathBuf,
        /// Store the CBOR payload uncompressed
        #[arg(long)]
        raw: bool,
    },
    /// Summarize a document
    Inspect {
        path: PathBuf,
        /// Dump the decoded document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render frames offscreen and write the last one as PNG
    Render {
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// Frames to simulate at 60 Hz before capturing
        #[arg(short, long, default_value = "1")]
        frames: u32,
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
        #[command(flatten)]
        harness: HarnessArgs,
    },
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if json {
        let data = decode(&bytes)?;
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let factory = CountingFactory::new();
    let doc = Document::import(&bytes, &factory)?;
    println!("{}: {} artboard(s), {} view model(s)", path.display(), doc.artboard_count(), doc.view_model_count());
    for index in 0..doc.artboard_count() {
        let Some(ab) = doc.artboard_at(index) else {
            continue;
        };
        println!(
            "  [{index}] {} {}x{}: {} shape(s), {} animation(s), {} state machine(s)",
            ab.name(),
            ab.width(),
            ab.height(),
            ab.shape_count(),
            ab.animation_count(),
            ab.state_machine_count()
        );
    }
    let stats = pathfiddle_render::ResourceFactory::stats(&factory);
    println!("  resources: {} path(s), {} paint(s)", stats.paths, stats.paints);
    Ok(())
}

fn render(width: u32, height: u32, frames: u32, output: &Path, harness: HarnessArgs) -> Result<()> {
    if frames == 0 {
        bail!("--frames must be at least 1");
    }
    let config = harness.into_config(true);
    config.apply_loader_override();

    let backend = create_backend(&config.selection, &config.options, None, width, height)?;
    let mut controller = FrameController::new(config);
    controller.init(backend);

    let mut surface = HeadlessSurface::new(width, height);
    let start = Instant::now();
    let step = Duration::from_secs_f64(1.0 / 60.0);
    let mut capture = None;
    for frame in 0..frames {
        if frame + 1 == frames {
            controller.handle_event(HostEvent::CaptureFrame)?;
        }
        capture = controller.tick(&mut surface, start + step * frame)?;
    }
    let elapsed = start.elapsed();

    let capture = capture.context("final frame produced no capture")?;
    let image = image::RgbaImage::from_raw(capture.width, capture.height, capture.pixels)
        .context("capture size does not match its pixel buffer")?;
    image
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    if let Some(backend) = controller.backend() {
        let stats = backend.stats();
        println!(
            "{}: {frames} frame(s) in {elapsed:.2?}, {} flush(es), {} readback(s) -> {}",
            backend.label(),
            stats.flushes,
            stats.readbacks,
            output.display()
        );
    }
    if !controller.scenes().has_document() {
        tracing::warn!("no document rendered; pass a document path to draw content");
    }
    controller.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("pathfiddle-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", pathfiddle_common::crate_info());
            println!("render: {}", pathfiddle_render::crate_info());
            println!("document: {}", pathfiddle_document::crate_info());
            println!("render-cpu: {}", pathfiddle_render_cpu::crate_info());
            println!("render-wgpu: {}", pathfiddle_render_wgpu::crate_info());
            println!("harness: {}", pathfiddle_harness::crate_info());
        }
        Commands::Sample { output, raw } => {
            let encoding = if raw { Encoding::Cbor } else { Encoding::CborZstd };
            let bytes = pathfiddle_document::encode(&sample_document(), encoding)?;
            std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
            println!("wrote {} ({} bytes, {encoding:?})", output.display(), bytes.len());
        }
        Commands::Inspect { path, json } => inspect(&path, json)?,
        Commands::Render {
            width,
            height,
            frames,
            output,
            harness,
        } => render(width, height, frames, &output, harness)?,
    }

    Ok(())
}
