//! Optical soundtrack extraction: one amplitude per scanline.
//!
//! Pipeline, strictly forward:
//! - Copy the selected region out of the capture and map it to luminance.
//! - Stretch contrast, box-blur, and pick an Otsu threshold over the field.
//! - Scan each row for the light/dark transition band ([`scan`]).
//! - Reject flat signals, then normalize, remove DC and smooth ([`post`]).
//!
//! [`extract_waveform`] runs the whole chain. [`prepare_field`] stops at the
//! threshold and keeps every intermediate field. [`scan_region`] stops after the
//! boundary scan and returns a [`ScanTrace`] for inspection; feed it to
//! [`waveform_from_trace`] to finish. No call keeps state, so identical
//! inputs always give bit-identical output.
//!
//! Rows are scanned independently. With the `parallel` feature the scan runs
//! on rayon, after the blur and threshold are complete for the whole region.

mod error;
mod extractor;
pub mod post;
pub mod scan;
pub mod stats;

pub use error::{ErrorKind, ExtractError};
pub use extractor::{
    DEFAULT_MIN_REGION_SIZE, DEFAULT_MIN_STD_DEV, FieldStages, ScanTrace, StrategyCounts,
    TrackExtractConfig, Waveform, check_region_size, check_variation, extract_waveform,
    prepare_field, scan_region, waveform_from_trace,
};
pub use post::{PostConfig, postprocess};
pub use scan::{EdgeStrategy, RowMeasure, STRATEGY_ORDER, measure_row, scan_rows};
