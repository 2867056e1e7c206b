use core::fmt;

use crate::{Error, Image, ImageView};

/// Integer rectangle inside a pixel buffer, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region spanning the whole of a `width x height` buffer.
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Rectangle between two drag corners given in any order. Both corners are
    /// exclusive on the far side, as a pointer drag from `a` to `b` reports.
    pub fn from_corners(a: (usize, usize), b: (usize, usize)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Exclusive right edge; `None` on overflow.
    pub fn right(&self) -> Option<usize> {
        self.x.checked_add(self.width)
    }

    /// Exclusive bottom edge; `None` on overflow.
    pub fn bottom(&self) -> Option<usize> {
        self.y.checked_add(self.height)
    }

    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        matches!((self.right(), self.bottom()), (Some(r), Some(b)) if r <= width && b <= height)
    }

    /// Intersection with a `width x height` buffer. A region that starts past
    /// the buffer collapses to zero size at the clamped origin.
    pub fn clamp_to(&self, width: usize, height: usize) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.right().unwrap_or(usize::MAX).min(width);
        let bottom = self.bottom().unwrap_or(usize::MAX).min(height);
        Self::new(x, y, right - x, bottom - y)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Copies `region` out of `src` into a tightly packed image, keeping pixel
/// order and layout.
pub fn extract_region<T: Copy>(src: &ImageView<'_, T>, region: Region) -> Result<Image<T>, Error> {
    if !region.fits_within(src.width(), src.height()) {
        return Err(Error::RegionOutOfBounds {
            region,
            width: src.width(),
            height: src.height(),
        });
    }

    let sub = src.subview(region.x, region.y, region.width, region.height)?;
    Ok(sub.to_image())
}
