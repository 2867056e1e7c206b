use crate::{Error, Image};

/// One captured pixel: red, green, blue, alpha.
pub type Rgba8 = [u8; 4];

/// Decoded capture as handed over by the acquisition layer.
pub type PixelBuffer = Image<Rgba8>;

const CHANNELS: usize = 4;

impl Image<Rgba8> {
    /// Wraps interleaved `RGBARGBA...` bytes, row-major from the top-left.
    pub fn from_rgba_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, Error> {
        if !bytes.len().is_multiple_of(CHANNELS) {
            return Err(Error::ChannelMismatch {
                channels: CHANNELS,
                len: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Image::from_vec(width, height, pixels)
    }

    /// Opaque buffer with every channel of a pixel set to its gray level.
    pub fn from_gray(width: usize, height: usize, gray: &[u8]) -> Result<Self, Error> {
        let pixels = gray.iter().map(|&v| [v, v, v, 255]).collect();
        Image::from_vec(width, height, pixels)
    }
}
