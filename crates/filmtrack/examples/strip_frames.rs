//! Example: soundtrack extraction on a vertically merged film strip.
//!
//! Loads an image of N equal-height frames stacked top to bottom, splits it
//! into frames and extracts one waveform per frame from the soundtrack column
//! `[track_x, track_x + track_width)`. Waveforms of consecutive frames join
//! into one continuous signal.
//!
//! Results are written to a JSON file next to the input image.
//! Per-frame and total timing is printed to stdout.
//!
//! Run from the workspace root:
//!   cargo run -p filmtrack --example strip_frames -- --help
//!   cargo run -p filmtrack --example strip_frames -- --input data/strip_0.png

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use filmtrack::{PixelBuffer, Region, TrackExtractConfig, scan_region, waveform_from_trace};
use image::ImageReader;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Extract soundtrack waveforms from a vertically merged film strip")]
struct Args {
    /// Path to the merged strip image
    #[arg(long, default_value = "data/strip_0.png")]
    input: PathBuf,

    /// Number of equal-height frames merged in the image
    #[arg(long, default_value_t = 4)]
    n_frames: usize,

    /// Left edge of the soundtrack column
    #[arg(long, default_value_t = 0)]
    track_x: usize,

    /// Width of the soundtrack column (default: full image width)
    #[arg(long)]
    track_width: Option<usize>,

    /// Optional TrackExtractConfig JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON path (default: <input stem>_waveforms.json next to input)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Serialize)]
struct FrameResult {
    frame: usize,
    region: [usize; 4],
    elapsed_ms: f64,
    threshold: Option<u8>,
    /// Error kind when the frame produced no waveform.
    error: Option<&'static str>,
    message: Option<String>,
    samples: Vec<f32>,
}

#[derive(Serialize)]
struct StripResult {
    input: String,
    n_frames: usize,
    frame_height: usize,
    total_ms: f64,
    frames: Vec<FrameResult>,
}

fn load_config(path: Option<&Path>) -> Result<TrackExtractConfig> {
    let Some(path) = path else {
        return Ok(TrackExtractConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn default_out_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let dir = input.parent().unwrap_or(Path::new("."));
    dir.join(format!("{stem}_waveforms.json"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = load_config(args.config.as_deref())?;

    let rgba = ImageReader::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?
        .decode()
        .with_context(|| format!("decoding {}", args.input.display()))?
        .into_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    let strip = PixelBuffer::from_rgba_bytes(width, height, rgba.as_raw())
        .context("building pixel buffer")?;

    let n_frames = args.n_frames;
    if n_frames == 0 {
        bail!("n_frames must be > 0");
    }
    if !height.is_multiple_of(n_frames) {
        bail!("image height {height} is not divisible by n_frames={n_frames}");
    }
    let frame_h = height / n_frames;
    let track_w = args
        .track_width
        .unwrap_or_else(|| width.saturating_sub(args.track_x));

    log::info!(
        "loaded {}: {width}x{height}, {n_frames} frames of {frame_h} rows, track column {}",
        args.input.display(),
        Region::new(args.track_x, 0, track_w, height)
    );

    let view = strip.as_view();
    let mut frames = Vec::with_capacity(n_frames);
    let total_start = Instant::now();

    for frame in 0..n_frames {
        let region = Region::new(args.track_x, frame * frame_h, track_w, frame_h);

        let t0 = Instant::now();
        let result = scan_region(&view, region, &cfg)
            .and_then(|trace| waveform_from_trace(&trace, &cfg).map(|w| (trace.threshold, w)));
        let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

        let entry = match result {
            Ok((threshold, wave)) => {
                println!("  frame {frame}: {} samples  ({elapsed_ms:.2} ms)", wave.len());
                FrameResult {
                    frame,
                    region: [region.x, region.y, region.width, region.height],
                    elapsed_ms,
                    threshold: Some(threshold),
                    error: None,
                    message: None,
                    samples: wave.into_vec(),
                }
            }
            Err(err) => {
                println!("  frame {frame}: {err}  ({elapsed_ms:.2} ms)");
                FrameResult {
                    frame,
                    region: [region.x, region.y, region.width, region.height],
                    elapsed_ms,
                    threshold: None,
                    error: Some(err.kind().as_str()),
                    message: Some(err.to_string()),
                    samples: Vec::new(),
                }
            }
        };
        frames.push(entry);
    }

    let total_ms = total_start.elapsed().as_secs_f64() * 1e3;
    println!("total extraction time: {total_ms:.2} ms");

    let out_path = args.out.unwrap_or_else(|| default_out_path(&args.input));
    let result = StripResult {
        input: args.input.display().to_string(),
        n_frames,
        frame_height: frame_h,
        total_ms,
        frames,
    };
    let out_file = std::fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(out_file, &result)
        .with_context(|| format!("writing JSON to {}", out_path.display()))?;

    println!("results written to {}", out_path.display());
    Ok(())
}
