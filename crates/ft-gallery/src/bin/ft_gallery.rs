use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use ft_core::{Image, PixelBuffer, Region};
use ft_filter::min_max;
use ft_track::{
    ScanTrace, StrategyCounts, TrackExtractConfig, check_variation, prepare_field, scan_region,
    waveform_from_trace,
};
use image::{GrayImage, Rgb, RgbImage};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "ft_gallery")]
#[command(about = "Run filmtrack pipeline stages on soundtrack scans")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump every field-preparation stage as PNG.
    #[command(name = "stages")]
    Stages(CommonArgs),
    /// Per-row boundary scan with an edge overlay.
    #[command(name = "scan")]
    Scan(CommonArgs),
    /// Full extraction to a waveform.
    #[command(name = "extract")]
    Extract(CommonArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// Region left edge
    #[arg(long, default_value_t = 0)]
    x: usize,
    /// Region top edge
    #[arg(long, default_value_t = 0)]
    y: usize,
    /// Region width (default: to the right edge of the image)
    #[arg(long)]
    width: Option<usize>,
    /// Region height (default: to the bottom edge of the image)
    #[arg(long)]
    height: Option<usize>,
    /// TrackExtractConfig JSON; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Serialize)]
struct RegionDto {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    area: usize,
}

impl From<Region> for RegionDto {
    fn from(r: Region) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            area: r.area(),
        }
    }
}

#[derive(Serialize)]
struct MetaStages {
    region: RegionDto,
    luminance_range: Option<[f32; 2]>,
    blur_radius: usize,
    threshold: u8,
    occupied_bins: usize,
    binarize_rule: &'static str,
}

#[derive(Serialize)]
struct RowDto {
    row: usize,
    amplitude: f32,
    strategy: &'static str,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Serialize)]
struct MetaScan {
    region: RegionDto,
    threshold: u8,
    strategies: StrategyCounts,
    raw_std_dev: f32,
}

#[derive(Serialize)]
struct ExtractResultDto {
    region: RegionDto,
    config: TrackExtractConfig,
    ok: bool,
    error_kind: Option<&'static str>,
    message: Option<String>,
    threshold: Option<u8>,
    samples: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Stages(args) => run_stages(args),
        Command::Scan(args) => run_scan(args),
        Command::Extract(args) => run_extract(args),
    }
}

fn run_stages(args: CommonArgs) -> Result<()> {
    let case_dir = prepare_case(&args, "stages")?;
    let cfg = load_config(args.config.as_deref())?;
    let img = load_input_rgba(&args.input)?;
    let region = resolve_region(&args, &img);

    let stages = prepare_field(&img.as_view(), region, &cfg)
        .with_context(|| format!("preparing region {region}"))?;
    let threshold = stages.threshold;
    let binary = stages
        .field
        .map(|&v| if v > threshold as f32 { 255u8 } else { 0 });

    save_field(case_dir.join("luminance.png"), &stages.luminance)?;
    save_field(case_dir.join("stretched.png"), &stages.stretched)?;
    save_field(case_dir.join("blurred.png"), &stages.field)?;
    save_u8_image(case_dir.join("binary.png"), &binary)?;

    write_json(
        case_dir.join("meta.json"),
        &MetaStages {
            region: region.into(),
            luminance_range: min_max(stages.luminance.data()).map(|(lo, hi)| [lo, hi]),
            blur_radius: cfg.blur_radius,
            threshold,
            occupied_bins: stages.histogram.occupied_bins(),
            binarize_rule: "pixel set iff blurred value > threshold",
        },
    )?;

    log::info!("stages for {region} written to {}", case_dir.display());
    Ok(())
}

fn run_scan(args: CommonArgs) -> Result<()> {
    let case_dir = prepare_case(&args, "scan")?;
    let cfg = load_config(args.config.as_deref())?;
    let img = load_input_rgba(&args.input)?;
    let region = resolve_region(&args, &img);

    let trace = scan_region(&img.as_view(), region, &cfg)
        .with_context(|| format!("scanning region {region}"))?;
    let raw = trace.raw();

    write_csv(case_dir.join("raw.csv"), &raw)?;
    write_json(case_dir.join("rows.json"), &row_dtos(&trace))?;
    render_edge_overlay(&trace)
        .save(case_dir.join("overlay.png"))
        .context("saving overlay image")?;

    // Flat scans still get a meta file.
    let raw_std_dev = match check_variation(&raw, cfg.min_std_dev) {
        Ok(s) => s,
        Err(ft_track::ExtractError::NoVariation { std_dev }) => std_dev,
        Err(err) => return Err(err.into()),
    };

    write_json(
        case_dir.join("meta.json"),
        &MetaScan {
            region: region.into(),
            threshold: trace.threshold,
            strategies: trace.strategy_counts(),
            raw_std_dev,
        },
    )?;

    log::info!(
        "scanned {} rows at threshold {}",
        trace.rows.len(),
        trace.threshold
    );
    Ok(())
}

fn run_extract(args: CommonArgs) -> Result<()> {
    let case_dir = prepare_case(&args, "extract")?;
    let cfg = load_config(args.config.as_deref())?;
    let img = load_input_rgba(&args.input)?;
    let region = resolve_region(&args, &img);

    let result = scan_region(&img.as_view(), region, &cfg)
        .and_then(|trace| waveform_from_trace(&trace, &cfg).map(|w| (trace.threshold, w)));

    let dto = match &result {
        Ok((threshold, wave)) => {
            write_csv(case_dir.join("waveform.csv"), wave.samples())?;
            render_waveform_plot(wave.samples(), 200)
                .save(case_dir.join("waveform.png"))
                .context("saving waveform plot")?;
            ExtractResultDto {
                region: region.into(),
                config: cfg,
                ok: true,
                error_kind: None,
                message: None,
                threshold: Some(*threshold),
                samples: wave.len(),
            }
        }
        Err(err) => {
            log::warn!("extraction failed: {err}");
            ExtractResultDto {
                region: region.into(),
                config: cfg,
                ok: false,
                error_kind: Some(err.kind().as_str()),
                message: Some(err.to_string()),
                threshold: None,
                samples: 0,
            }
        }
    };
    write_json(case_dir.join("result.json"), &dto)?;

    // Only malformed input fails the run.
    if let Err(err) = result
        && !err.is_user_recoverable()
    {
        bail!("extraction on {} failed: {err}", args.input.display());
    }
    Ok(())
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;
    if let Some(config) = &common.config {
        ensure_file_exists(config, "config")?;
    }

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    let ext = common
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    let copy_to = case_dir.join(format!("input.{ext}"));
    fs::copy(&common.input, &copy_to).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            copy_to.display()
        )
    })?;

    Ok(case_dir)
}

fn load_config(path: Option<&Path>) -> Result<TrackExtractConfig> {
    let Some(path) = path else {
        return Ok(TrackExtractConfig::default());
    };
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing config {}", path.display()))
}

fn load_input_rgba(path: &Path) -> Result<PixelBuffer> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let rgba = dyn_img.to_rgba8();
    let (w, h) = rgba.dimensions();

    PixelBuffer::from_rgba_bytes(w as usize, h as usize, rgba.as_raw())
        .with_context(|| format!("constructing pixel buffer from {}", path.display()))
}

fn resolve_region(args: &CommonArgs, img: &PixelBuffer) -> Region {
    let width = args
        .width
        .unwrap_or_else(|| img.width().saturating_sub(args.x));
    let height = args
        .height
        .unwrap_or_else(|| img.height().saturating_sub(args.y));
    Region::new(args.x, args.y, width, height)
}

fn row_dtos(trace: &ScanTrace) -> Vec<RowDto> {
    trace
        .rows
        .iter()
        .enumerate()
        .map(|(row, m)| RowDto {
            row,
            amplitude: m.amplitude,
            strategy: m.strategy.name(),
            left: m.left,
            right: m.right,
        })
        .collect()
}

fn save_u8_image(path: PathBuf, img: &Image<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Saves a `[0, 255]` brightness field, rounding and clamping to bytes.
fn save_field(path: PathBuf, field: &Image<f32>) -> Result<()> {
    let bytes = field.map(|&v| v.round().clamp(0.0, 255.0) as u8);
    save_u8_image(path, &bytes)
}

/// Blurred field with the band start in green and the band end in red.
/// Rows measured by mean brightness carry no marks.
fn render_edge_overlay(trace: &ScanTrace) -> RgbImage {
    let field = &trace.field;
    let mut rgb = RgbImage::from_fn(field.width() as u32, field.height() as u32, |x, y| {
        let v = field.row(y as usize)[x as usize].round().clamp(0.0, 255.0) as u8;
        Rgb([v, v, v])
    });

    for (y, m) in trace.rows.iter().enumerate() {
        if let Some(left) = m.left {
            put_clipped(&mut rgb, left, y, Rgb([64, 220, 64]));
        }
        // `right` is one past the band.
        if let Some(right) = m.right {
            put_clipped(&mut rgb, right.saturating_sub(1), y, Rgb([255, 64, 64]));
        }
    }
    rgb
}

/// Time runs left to right, one column per sample; the zero line is grey.
fn render_waveform_plot(samples: &[f32], height: u32) -> RgbImage {
    let width = samples.len().max(1) as u32;
    let mut img = RgbImage::from_pixel(width, height, Rgb([16, 16, 16]));
    let to_y = |v: f32| {
        let t = (1.0 - v.clamp(-1.0, 1.0)) * 0.5;
        (t * (height - 1) as f32).round() as u32
    };

    let zero = to_y(0.0);
    for x in 0..width {
        img.put_pixel(x, zero, Rgb([96, 96, 96]));
    }
    for (x, &v) in samples.iter().enumerate() {
        let (a, b) = (zero.min(to_y(v)), zero.max(to_y(v)));
        for y in a..=b {
            img.put_pixel(x as u32, y, Rgb([255, 200, 64]));
        }
    }
    img
}

fn put_clipped(img: &mut RgbImage, x: usize, y: usize, color: Rgb<u8>) {
    let (ux, uy) = (x as u32, y as u32);
    if ux < img.width() && uy < img.height() {
        img.put_pixel(ux, uy, color);
    }
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn write_csv(path: PathBuf, values: &[f32]) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "row,value").context("writing csv header")?;
    for (i, v) in values.iter().enumerate() {
        writeln!(file, "{i},{v}").context("writing csv row")?;
    }
    Ok(())
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
