/// Number of brightness bins, one per 8-bit level.
pub const BINS: usize = 256;

/// Counts of brightness values over `[0, 255]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u32; BINS],
    total: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            bins: [0; BINS],
            total: 0,
        }
    }

    /// Bins every value after flooring and clamping it to `[0, 255]`.
    pub fn from_values(values: &[f32]) -> Self {
        let mut hist = Self::new();
        for &v in values {
            hist.add(v);
        }
        hist
    }

    #[inline]
    pub fn add(&mut self, value: f32) {
        self.bins[bin_index(value)] += 1;
        self.total += 1;
    }

    pub fn bins(&self) -> &[u32; BINS] {
        &self.bins
    }

    pub fn count(&self, level: u8) -> u32 {
        self.bins[level as usize]
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of bins holding at least one value.
    pub fn occupied_bins(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0).count()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bin_index(value: f32) -> usize {
    // `as` saturates and maps NaN to 0.
    (value.floor() as i64).clamp(0, (BINS - 1) as i64) as usize
}
