//! Waveform post-processing: range normalization, DC removal and smoothing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Centered moving-average width. `0` and `1` disable smoothing.
    pub smoothing_window: usize,
    /// Clamp the final samples to `[-1, 1]`. Off by default: DC removal can
    /// push a sample past the unit range on strongly asymmetric tracks, and
    /// clamping it moves the mean off zero.
    pub clamp_output: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            clamp_output: false,
        }
    }
}

/// Maps `values` linearly onto `[-1, 1]`. A flat input maps to all zeros.
pub fn normalize_min_max(values: &[f32]) -> Vec<f32> {
    let Some((lo, hi)) = ft_filter::min_max(values) else {
        return vec![0.0; values.len()];
    };
    if hi <= lo {
        return vec![0.0; values.len()];
    }

    let span = hi - lo;
    values
        .iter()
        .map(|&v| 2.0 * (v - lo) / span - 1.0)
        .collect()
}

/// Subtracts the mean so the samples sum to zero.
pub fn remove_dc(values: &mut [f32]) {
    let m = crate::stats::mean(values);
    for v in values.iter_mut() {
        *v -= m;
    }
}

/// Centered moving average of width `window`. Windows are truncated at both
/// ends and divided by the number of samples they actually cover.
pub fn smooth_centered(values: &[f32], window: usize) -> Vec<f32> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let half = window / 2;
    let n = values.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &v in values {
        acc += v as f64;
        prefix.push(acc);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            ((prefix[hi] - prefix[lo]) / (hi - lo) as f64) as f32
        })
        .collect()
}

pub fn clamp_unit(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = v.clamp(-1.0, 1.0);
    }
}

/// Normalizes, removes DC and smooths a raw per-row waveform, then clamps it
/// when `config.clamp_output` is set.
pub fn postprocess(raw: &[f32], config: &PostConfig) -> Vec<f32> {
    let mut out = normalize_min_max(raw);
    remove_dc(&mut out);
    let mut out = smooth_centered(&out, config.smoothing_window);
    if config.clamp_output {
        clamp_unit(&mut out);
    }
    out
}
