use core::fmt;

use ft_core::Region;

/// Why an extraction produced no waveform. Extraction is all-or-nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Region narrower or shorter than the configured minimum. Checked before
    /// any pixel is read.
    RegionTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    /// The raw per-row signal is flat: blank stock or a misaligned capture.
    NoVariation { std_dev: f32 },
    /// Region is not fully inside the pixel buffer.
    MalformedInput {
        region: Region,
        source: ft_core::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RegionTooSmall,
    NoVariation,
    MalformedInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegionTooSmall => "region_too_small",
            Self::NoVariation => "no_variation",
            Self::MalformedInput => "malformed_input",
        }
    }
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RegionTooSmall { .. } => ErrorKind::RegionTooSmall,
            Self::NoVariation { .. } => ErrorKind::NoVariation,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
        }
    }

    /// True when re-selecting the region or recapturing can fix the input.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self, Self::MalformedInput { .. })
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionTooSmall { width, height, min } => {
                write!(f, "region {width}x{height} is smaller than {min}x{min}")
            }
            Self::NoVariation { std_dev } => {
                write!(f, "no track variation found (std dev {std_dev:.4})")
            }
            Self::MalformedInput { region, source } => {
                write!(f, "malformed input for region {region}: {source}")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedInput { source, .. } => Some(source),
            _ => None,
        }
    }
}
