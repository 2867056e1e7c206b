//! Per-row boundary scan against a global threshold.
//!
//! Each row is measured on its own by trying the strategies in
//! [`STRATEGY_ORDER`] and keeping the first that yields a measure. Light and
//! dark bands report the fraction of the row covered by the first band of
//! that polarity. The last resort reports the row's mean brightness instead,
//! which is a different physical quantity on the same `[0, 1]` scale;
//! [`RowMeasure::strategy`] tells the two apart.

use ft_core::ImageView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeStrategy {
    /// First run of samples `> t`.
    LightBand,
    /// First run of samples `<= t`.
    DarkBand,
    /// Row mean divided by 255.
    MeanBrightness,
}

/// Fixed priority in which strategies are tried for every row.
pub const STRATEGY_ORDER: [EdgeStrategy; 3] = [
    EdgeStrategy::LightBand,
    EdgeStrategy::DarkBand,
    EdgeStrategy::MeanBrightness,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMeasure {
    /// Raw amplitude in `[0, 1]` for finite input.
    pub amplitude: f32,
    pub strategy: EdgeStrategy,
    /// Index of the first sample of the band.
    pub left: Option<usize>,
    /// Index one past the band; the row width when the band runs to the end.
    pub right: Option<usize>,
}

impl EdgeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LightBand => "light_band",
            Self::DarkBand => "dark_band",
            Self::MeanBrightness => "mean_brightness",
        }
    }

    /// True when the amplitude is a band width ratio rather than a brightness.
    pub fn measures_width(&self) -> bool {
        !matches!(self, Self::MeanBrightness)
    }

    pub fn measure(self, row: &[f32], threshold: f32) -> Option<RowMeasure> {
        match self {
            Self::LightBand => band(row, self, |v| v > threshold, |v| v <= threshold),
            Self::DarkBand => band(row, self, |v| v <= threshold, |v| v > threshold),
            Self::MeanBrightness => Some(brightness_measure(row)),
        }
    }
}

fn band(
    row: &[f32],
    strategy: EdgeStrategy,
    starts: impl Fn(f32) -> bool,
    stops: impl Fn(f32) -> bool,
) -> Option<RowMeasure> {
    let width = row.len();
    let left = row.iter().position(|&v| starts(v))?;
    let right = row[left + 1..]
        .iter()
        .position(|&v| stops(v))
        .map_or(width, |i| left + 1 + i);

    Some(RowMeasure {
        amplitude: (right - left) as f32 / width as f32,
        strategy,
        left: Some(left),
        right: Some(right),
    })
}

fn brightness_measure(row: &[f32]) -> RowMeasure {
    let amplitude = if row.is_empty() {
        0.0
    } else {
        let sum: f64 = row.iter().map(|&v| v as f64).sum();
        (sum / row.len() as f64 / 255.0) as f32
    };
    RowMeasure {
        amplitude,
        strategy: EdgeStrategy::MeanBrightness,
        left: None,
        right: None,
    }
}

/// Measures one row with the first strategy in [`STRATEGY_ORDER`] that applies.
pub fn measure_row(row: &[f32], threshold: f32) -> RowMeasure {
    STRATEGY_ORDER
        .iter()
        .find_map(|s| s.measure(row, threshold))
        .unwrap_or_else(|| brightness_measure(row))
}

/// Measures every row of `field`, top to bottom.
pub fn scan_rows(field: &ImageView<'_, f32>, threshold: f32) -> Vec<RowMeasure> {
    field
        .rows()
        .map(|row| measure_row(row, threshold))
        .collect()
}

/// Same as [`scan_rows`], with rows spread over the rayon pool. Output order
/// and values are identical.
#[cfg(feature = "parallel")]
pub fn scan_rows_par(field: &ImageView<'_, f32>, threshold: f32) -> Vec<RowMeasure> {
    use rayon::prelude::*;

    (0..field.height())
        .into_par_iter()
        .map(|y| measure_row(field.row(y), threshold))
        .collect()
}
