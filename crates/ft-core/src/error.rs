use core::fmt;

use crate::Region;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch {
        expected: usize,
        actual: usize,
    },
    /// Interleaved byte length is not a whole number of pixels.
    ChannelMismatch {
        channels: usize,
        len: usize,
    },
    OutOfBounds,
    RegionOutOfBounds {
        region: Region,
        width: usize,
        height: usize,
    },
    InvalidStride,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::ChannelMismatch { channels, len } => {
                write!(f, "{len} bytes do not split into {channels}-channel pixels")
            }
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::RegionOutOfBounds {
                region,
                width,
                height,
            } => write!(f, "region {region} exceeds {width}x{height} buffer"),
            Self::InvalidStride => write!(f, "invalid stride"),
        }
    }
}

impl std::error::Error for Error {}
