//! Field preparation for track-edge detection.
//!
//! Every function here is a pure transform from one image to a new one, in
//! the order the extraction pipeline applies them:
//!
//! 1. [`luminance_rgba`] maps RGBA pixels to scalar brightness.
//! 2. [`stretch_contrast`] rescales brightness to `[0, 255]`.
//! 3. [`box_blur_f32`] averages a square neighborhood, clipped at the borders.
//! 4. [`Histogram::from_values`] and [`otsu_threshold`] pick a global
//!    binarization level.
//!
//! Float fields are `Image<f32>` in row-major order; no stage mixes rows in a
//! way that changes the row count or order.

pub mod box_blur;
pub mod contrast;
pub mod histogram;
pub mod luma;
pub mod otsu;

pub use box_blur::{DEFAULT_BLUR_RADIUS, box_blur_f32};
pub use contrast::{min_max, stretch_contrast};
pub use histogram::{BINS, Histogram};
pub use luma::{LumaWeights, luminance_rgba};
pub use otsu::otsu_threshold;
