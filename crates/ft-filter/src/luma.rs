use ft_core::{Image, ImageView, Rgba8};

/// Per-channel weights of a weighted-sum luma conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaWeights {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl LumaWeights {
    /// ITU-R BT.601 luma coefficients.
    pub const BT601: Self = Self {
        r: 0.299,
        g: 0.587,
        b: 0.114,
    };

    #[inline]
    pub fn apply(&self, px: &Rgba8) -> f32 {
        self.r * px[0] as f32 + self.g * px[1] as f32 + self.b * px[2] as f32
    }
}

impl Default for LumaWeights {
    fn default() -> Self {
        Self::BT601
    }
}

/// Maps every pixel to BT.601 brightness. Alpha is ignored.
pub fn luminance_rgba(src: &ImageView<'_, Rgba8>) -> Image<f32> {
    luminance_rgba_with(src, LumaWeights::BT601)
}

pub fn luminance_rgba_with(src: &ImageView<'_, Rgba8>, weights: LumaWeights) -> Image<f32> {
    src.map(|px| weights.apply(px))
}
