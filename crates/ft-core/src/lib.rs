//! Foundational primitives for optical soundtrack extraction.
//!
//! ## Buffers and Views
//! [`Image`] owns a row-major grid of pixels; [`ImageView`] borrows one with
//! an element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`,
//! which lets a view cover a sub-rectangle of a larger buffer.
//!
//! ## Pixel Buffers
//! Captured frames arrive as [`PixelBuffer`]: one [`Rgba8`] per pixel, with
//! the origin at the top-left corner. The core never mutates a pixel buffer.
//!
//! ## Regions
//! A [`Region`] is an integer rectangle selected by the caller. Use
//! [`Region::clamp_to`] before handing a region to the pipeline;
//! [`extract_region`] rejects anything that is not fully inside the buffer.

mod error;
mod image;
mod pixel;
mod region;

pub use error::Error;
pub use image::{Image, ImageView, Rows};
pub use pixel::{PixelBuffer, Rgba8};
pub use region::{Region, extract_region};
