use ft_core::{Image, ImageView, Region, Rgba8, extract_region};
use ft_filter::{
    DEFAULT_BLUR_RADIUS, Histogram, box_blur_f32, luminance_rgba, min_max, otsu_threshold,
    stretch_contrast,
};
use log::{Level, debug, log_enabled};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::post::{PostConfig, postprocess};
use crate::scan::{EdgeStrategy, RowMeasure};
use crate::stats;

pub const DEFAULT_MIN_REGION_SIZE: usize = 20;
pub const DEFAULT_MIN_STD_DEV: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackExtractConfig {
    /// Regions narrower or shorter than this are rejected before any pixel is read.
    pub min_region_size: usize,
    pub blur_radius: usize,
    /// Raw waveforms with a smaller population standard deviation are rejected.
    pub min_std_dev: f32,
    pub post: PostConfig,
}

impl Default for TrackExtractConfig {
    fn default() -> Self {
        Self {
            min_region_size: DEFAULT_MIN_REGION_SIZE,
            blur_radius: DEFAULT_BLUR_RADIUS,
            min_std_dev: DEFAULT_MIN_STD_DEV,
            post: PostConfig::default(),
        }
    }
}

/// One sample per region row, top to bottom, with roughly zero mean. Samples stay in
/// `[-1, 1]` when [`PostConfig::clamp_output`] is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Waveform {
    samples: Vec<f32>,
}

impl Waveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.samples
    }
}

impl From<Waveform> for Vec<f32> {
    fn from(w: Waveform) -> Self {
        w.samples
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrategyCounts {
    pub light_band: usize,
    pub dark_band: usize,
    pub mean_brightness: usize,
}

impl StrategyCounts {
    pub fn total(&self) -> usize {
        self.light_band + self.dark_band + self.mean_brightness
    }
}

/// Intermediate state of a region scan, up to and including the per-row
/// boundary measures.
#[derive(Debug, Clone)]
pub struct ScanTrace {
    pub region: Region,
    /// Stretched and blurred brightness field the rows were scanned on.
    pub field: Image<f32>,
    pub histogram: Histogram,
    pub threshold: u8,
    pub rows: Vec<RowMeasure>,
}

impl ScanTrace {
    /// Raw per-row amplitudes, before validation and post-processing.
    pub fn raw(&self) -> Vec<f32> {
        self.rows.iter().map(|m| m.amplitude).collect()
    }

    pub fn strategy_counts(&self) -> StrategyCounts {
        let mut counts = StrategyCounts::default();
        for m in &self.rows {
            match m.strategy {
                EdgeStrategy::LightBand => counts.light_band += 1,
                EdgeStrategy::DarkBand => counts.dark_band += 1,
                EdgeStrategy::MeanBrightness => counts.mean_brightness += 1,
            }
        }
        counts
    }
}

pub fn check_region_size(region: Region, min: usize) -> Result<(), ExtractError> {
    if region.width < min || region.height < min {
        return Err(ExtractError::RegionTooSmall {
            width: region.width,
            height: region.height,
            min,
        });
    }
    Ok(())
}

/// Returns the population standard deviation of `raw` when it reaches
/// `min_std_dev`. A NaN spread counts as no variation.
pub fn check_variation(raw: &[f32], min_std_dev: f32) -> Result<f32, ExtractError> {
    let std_dev = stats::std_dev(raw);
    if std_dev >= min_std_dev {
        Ok(std_dev)
    } else {
        Err(ExtractError::NoVariation { std_dev })
    }
}

/// Every prepared field of a region, up to the global threshold.
#[derive(Debug, Clone)]
pub struct FieldStages {
    pub region: Region,
    pub luminance: Image<f32>,
    pub stretched: Image<f32>,
    /// Stretched and blurred brightness field.
    pub field: Image<f32>,
    pub histogram: Histogram,
    pub threshold: u8,
}

/// Runs region extraction through threshold selection.
///
/// The region size is checked first, so an undersized region is reported as
/// [`ExtractError::RegionTooSmall`] even when it also lies outside the buffer.
pub fn prepare_field(
    src: &ImageView<'_, Rgba8>,
    region: Region,
    cfg: &TrackExtractConfig,
) -> Result<FieldStages, ExtractError> {
    check_region_size(region, cfg.min_region_size)?;
    let pixels = extract_region(src, region)
        .map_err(|source| ExtractError::MalformedInput { region, source })?;
    debug!(
        "preparing region {region} of {}x{} buffer",
        src.width(),
        src.height()
    );

    let luminance = luminance_rgba(&pixels.as_view());
    if log_enabled!(Level::Debug)
        && let Some((lo, hi)) = min_max(luminance.data())
    {
        debug!("luminance range [{lo:.2}, {hi:.2}]");
    }

    let stretched = stretch_contrast(&luminance.as_view());
    let field = box_blur_f32(&stretched.as_view(), cfg.blur_radius);
    let histogram = Histogram::from_values(field.data());
    let threshold = otsu_threshold(&histogram);
    debug!(
        "threshold {threshold} over {} occupied bins",
        histogram.occupied_bins()
    );

    Ok(FieldStages {
        region,
        luminance,
        stretched,
        field,
        histogram,
        threshold,
    })
}

/// Runs region extraction through the boundary scan. Same checks and order
/// as [`prepare_field`].
pub fn scan_region(
    src: &ImageView<'_, Rgba8>,
    region: Region,
    cfg: &TrackExtractConfig,
) -> Result<ScanTrace, ExtractError> {
    let FieldStages {
        region,
        field,
        histogram,
        threshold,
        ..
    } = prepare_field(src, region, cfg)?;

    #[cfg(feature = "parallel")]
    let rows = crate::scan::scan_rows_par(&field.as_view(), threshold as f32);
    #[cfg(not(feature = "parallel"))]
    let rows = crate::scan::scan_rows(&field.as_view(), threshold as f32);

    let trace = ScanTrace {
        region,
        field,
        histogram,
        threshold,
        rows,
    };
    debug!("row strategies {:?}", trace.strategy_counts());
    Ok(trace)
}

/// Validates and post-processes the raw amplitudes of a finished scan.
pub fn waveform_from_trace(
    trace: &ScanTrace,
    cfg: &TrackExtractConfig,
) -> Result<Waveform, ExtractError> {
    let raw = trace.raw();
    let std_dev = check_variation(&raw, cfg.min_std_dev)?;
    debug!("raw std dev {std_dev:.4} over {} rows", raw.len());

    Ok(Waveform {
        samples: postprocess(&raw, &cfg.post),
    })
}

/// Extracts the audio waveform of the soundtrack inside `region`.
pub fn extract_waveform(
    src: &ImageView<'_, Rgba8>,
    region: Region,
    cfg: &TrackExtractConfig,
) -> Result<Waveform, ExtractError> {
    let trace = scan_region(src, region, cfg)?;
    waveform_from_trace(&trace, cfg)
}

#[cfg(test)]
mod tests {
    use ft_core::{PixelBuffer, Region};

    use super::{
        DEFAULT_MIN_REGION_SIZE, TrackExtractConfig, extract_waveform, prepare_field, scan_region,
        waveform_from_trace,
    };
    use crate::post::PostConfig;
    use crate::error::{ErrorKind, ExtractError};
    use crate::scan::EdgeStrategy;

    /// Black frame with a white band of `band(y)` pixels at the left of each row.
    fn banded(width: usize, height: usize, band: impl Fn(usize) -> usize) -> PixelBuffer {
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..band(y).min(width) {
                gray[y * width + x] = 255;
            }
        }
        PixelBuffer::from_gray(width, height, &gray).expect("valid buffer")
    }

    fn two_level() -> PixelBuffer {
        banded(20, 20, |y| if y < 10 { 5 } else { 15 })
    }

    fn mean(s: &[f32]) -> f32 {
        s.iter().sum::<f32>() / s.len() as f32
    }

    struct Lcg(u64);

    impl Lcg {
        fn next_u32(&mut self) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 33) as u32
        }

        fn below(&mut self, n: usize) -> usize {
            self.next_u32() as usize % n
        }
    }

    #[test]
    fn tiny_uniform_region_has_no_variation() {
        let img = PixelBuffer::from_gray(4, 4, &[128u8; 16]).expect("valid buffer");
        let region = Region::full(4, 4);

        let err = extract_waveform(&img.as_view(), region, &TrackExtractConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::RegionTooSmall {
                width: 4,
                height: 4,
                min: DEFAULT_MIN_REGION_SIZE
            }
        );

        let cfg = TrackExtractConfig {
            min_region_size: 4,
            ..TrackExtractConfig::default()
        };
        let err = extract_waveform(&img.as_view(), region, &cfg).unwrap_err();
        assert!(matches!(err, ExtractError::NoVariation { std_dev } if std_dev == 0.0));
    }

    #[test]
    fn constant_band_has_no_variation() {
        let img = banded(20, 20, |_| 10);
        let err = extract_waveform(
            &img.as_view(),
            Region::full(20, 20),
            &TrackExtractConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoVariation);
    }

    #[test]
    fn uniform_region_has_no_variation() {
        let img = PixelBuffer::from_gray(32, 32, &[77u8; 32 * 32]).expect("valid buffer");
        let err = extract_waveform(
            &img.as_view(),
            Region::new(4, 4, 24, 24),
            &TrackExtractConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoVariation);
    }

    #[test]
    fn two_level_track_gives_opposite_halves() {
        let img = two_level();
        let cfg = TrackExtractConfig::default();
        let wave = extract_waveform(&img.as_view(), Region::full(20, 20), &cfg)
            .expect("track has variation");
        let s = wave.samples();

        assert_eq!(wave.len(), 20);
        assert!(s[..5].iter().all(|&v| v < 0.0));
        assert!(s[14..].iter().all(|&v| v > 0.0));
        assert!(s[7..12].iter().any(|&v| v > -0.9 && v < 0.9));
        assert!(s.iter().all(|v| v.is_finite()));
        assert!(mean(s).abs() < 1e-3);

        let clamped_cfg = TrackExtractConfig {
            post: PostConfig {
                clamp_output: true,
                ..PostConfig::default()
            },
            ..cfg
        };
        let clamped = extract_waveform(&img.as_view(), Region::full(20, 20), &clamped_cfg)
            .expect("track has variation");
        let c = clamped.samples();
        assert!(c.iter().all(|v| (-1.0..=1.0).contains(v)));
        let peak = c.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!((peak - 1.0).abs() < 1e-5);
    }

    #[test]
    fn asymmetric_track_stays_dc_free_by_default() {
        // Four wide rows among narrow ones push the post-DC peak past 1.
        let img = banded(40, 40, |y| if (30..34).contains(&y) { 30 } else { 10 });
        let region = Region::full(40, 40);

        let wave = extract_waveform(&img.as_view(), region, &TrackExtractConfig::default())
            .expect("track has variation");
        let s = wave.samples();
        assert_eq!(s.len(), 40);
        assert!(mean(s).abs() < 1e-3);
        assert!(s.iter().any(|&v| v > 1.0));

        let clamped_cfg = TrackExtractConfig {
            post: PostConfig {
                clamp_output: true,
                ..PostConfig::default()
            },
            ..TrackExtractConfig::default()
        };
        let clamped = extract_waveform(&img.as_view(), region, &clamped_cfg)
            .expect("track has variation");
        assert!(clamped.samples().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn two_level_trace_measures_light_bands() {
        let img = two_level();
        let trace = scan_region(
            &img.as_view(),
            Region::full(20, 20),
            &TrackExtractConfig::default(),
        )
        .expect("valid region");

        assert_eq!(trace.rows.len(), 20);
        assert_eq!(trace.field.width(), 20);
        assert_eq!(trace.histogram.total(), 400);
        let counts = trace.strategy_counts();
        assert_eq!(counts.light_band, 20);
        assert_eq!(counts.total(), 20);

        let raw = trace.raw();
        assert!((raw[0] - 0.25).abs() < 0.06);
        assert!((raw[19] - 0.75).abs() < 0.06);
        assert_eq!(trace.rows[0].left, Some(0));
        assert_eq!(trace.rows[0].strategy, EdgeStrategy::LightBand);
    }

    #[test]
    fn narrow_region_rejected_before_bounds() {
        let img = PixelBuffer::from_gray(32, 32, &[0u8; 32 * 32]).expect("valid buffer");
        let cfg = TrackExtractConfig::default();

        let err = extract_waveform(&img.as_view(), Region::new(0, 0, 19, 25), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegionTooSmall);

        // Also outside the buffer: size still wins.
        let err = extract_waveform(&img.as_view(), Region::new(100, 100, 19, 25), &cfg)
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::RegionTooSmall {
                width: 19,
                height: 25,
                min: 20
            }
        );
    }

    #[test]
    fn region_outside_buffer_is_malformed() {
        let img = PixelBuffer::from_gray(32, 32, &[0u8; 32 * 32]).expect("valid buffer");
        let region = Region::new(10, 10, 30, 30);
        let err = extract_waveform(&img.as_view(), region, &TrackExtractConfig::default())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(matches!(err, ExtractError::MalformedInput { region: r, .. } if r == region));
        assert!(!err.is_user_recoverable());
    }

    #[test]
    fn offset_region_matches_cropped_buffer() {
        let inner = two_level();
        let (w, h) = (48usize, 40usize);
        let mut gray = vec![90u8; w * h];
        for y in 0..20 {
            for x in 0..20 {
                gray[(y + 7) * w + x + 11] = inner.row(y)[x][0];
            }
        }
        let outer = PixelBuffer::from_gray(w, h, &gray).expect("valid buffer");
        let cfg = TrackExtractConfig::default();

        let a = extract_waveform(&inner.as_view(), Region::full(20, 20), &cfg).expect("ok");
        let b = extract_waveform(&outer.as_view(), Region::new(11, 7, 20, 20), &cfg).expect("ok");
        assert_eq!(a, b);
    }

    #[test]
    fn stages_check_size_before_reading_pixels() {
        let img = PixelBuffer::from_gray(32, 32, &[0u8; 32 * 32]).expect("valid buffer");
        let cfg = TrackExtractConfig::default();

        let err = prepare_field(&img.as_view(), Region::new(0, 0, 12, 12), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegionTooSmall);
        let err = prepare_field(&img.as_view(), Region::new(200, 0, 12, 30), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegionTooSmall);
        let err = prepare_field(&img.as_view(), Region::new(20, 0, 20, 20), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn stages_feed_the_scan() {
        let img = two_level();
        let cfg = TrackExtractConfig::default();
        let stages = prepare_field(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");
        let trace = scan_region(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");

        assert_eq!(stages.luminance.width(), 20);
        assert_eq!(stages.stretched.height(), 20);
        assert_eq!(stages.field, trace.field);
        assert_eq!(stages.threshold, trace.threshold);
        assert_eq!(stages.histogram, trace.histogram);
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = two_level();
        let cfg = TrackExtractConfig::default();
        let a = extract_waveform(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");
        let b = extract_waveform(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");
        assert_eq!(a, b);
    }

    #[test]
    fn trace_and_pipeline_agree() {
        let img = two_level();
        let cfg = TrackExtractConfig::default();
        let trace = scan_region(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");
        let from_trace = waveform_from_trace(&trace, &cfg).expect("ok");
        let direct = extract_waveform(&img.as_view(), Region::full(20, 20), &cfg).expect("ok");
        assert_eq!(from_trace, direct);
    }

    #[test]
    fn random_buffers_yield_waveform_or_no_variation() {
        let mut rng = Lcg(0x5eed);
        let cfg = TrackExtractConfig {
            post: PostConfig {
                clamp_output: true,
                ..PostConfig::default()
            },
            ..TrackExtractConfig::default()
        };

        for _ in 0..24 {
            let w = 20 + rng.below(40);
            let h = 20 + rng.below(40);
            let bytes: Vec<u8> = (0..w * h * 4).map(|_| rng.next_u32() as u8).collect();
            let img = PixelBuffer::from_rgba_bytes(w, h, &bytes).expect("valid buffer");

            let rw = 20 + rng.below(w - 19);
            let rh = 20 + rng.below(h - 19);
            let region = Region::new(rng.below(w - rw + 1), rng.below(h - rh + 1), rw, rh);

            match extract_waveform(&img.as_view(), region, &cfg) {
                Ok(wave) => {
                    assert_eq!(wave.len(), rh);
                    assert!(
                        wave.samples()
                            .iter()
                            .all(|v| v.is_finite() && (-1.0..=1.0).contains(v))
                    );
                }
                Err(err) => assert_eq!(err.kind(), ErrorKind::NoVariation),
            }
        }
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let cfg: TrackExtractConfig =
            serde_json::from_str(r#"{ "blur_radius": 1, "post": { "smoothing_window": 3 } }"#)
                .expect("valid config");

        assert_eq!(cfg.blur_radius, 1);
        assert_eq!(cfg.min_region_size, DEFAULT_MIN_REGION_SIZE);
        assert_eq!(cfg.post.smoothing_window, 3);
        assert!(!cfg.post.clamp_output);

        let cfg: TrackExtractConfig =
            serde_json::from_str(r#"{ "post": { "clamp_output": true } }"#).expect("valid config");
        assert!(cfg.post.clamp_output);
        assert_eq!(cfg.post.smoothing_window, 5);
    }
}
