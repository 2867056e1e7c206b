//! Umbrella crate for the `filmtrack` workspace.
//!
//! Re-exports the pixel containers, the field filters and the track
//! extractor, so a caller can decode a scan and turn a selected region into
//! a waveform with a single dependency.

pub use ft_core::*;
pub use ft_filter::{Histogram, otsu_threshold};
pub use ft_track::*;
