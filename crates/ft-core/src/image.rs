use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    /// Builds a same-sized image by applying `f` to every pixel in row-major order.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Image<U> {
        Image {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

#[derive(Debug)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

// Manual impls: a view is a borrow, copyable whatever the pixel type.
impl<T> Clone for ImageView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ImageView<'_, T> {}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        if stride < width {
            return Err(Error::InvalidStride);
        }

        let min_len = min_required_len(width, height, stride).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() < min_len {
            return Err(Error::SizeMismatch {
                expected: min_len,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn rows(&self) -> Rows<'a, T> {
        Rows { view: *self, y: 0 }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageView<'a, T>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(Error::OutOfBounds)?;
        let min_len = min_required_len(width, height, self.stride).ok_or(Error::OutOfBounds)?;
        let tail = self.data.get(start..).ok_or(Error::OutOfBounds)?;

        if tail.len() < min_len {
            return Err(Error::OutOfBounds);
        }

        Ok(ImageView {
            width,
            height,
            stride: self.stride,
            data: tail,
        })
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.width
    }

    pub fn as_contiguous_slice(&self) -> Option<&'a [T]> {
        if !self.is_contiguous() {
            return None;
        }
        self.data.get(0..self.len())
    }

    /// Packed image of `f` applied to every viewed pixel, row by row.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Image<U> {
        let mut data = Vec::with_capacity(self.len());
        for row in self.rows() {
            data.extend(row.iter().map(&mut f));
        }
        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl<T: Copy> ImageView<'_, T> {
    /// Copies the viewed pixels into a tightly packed owned image.
    pub fn to_image(&self) -> Image<T> {
        if let Some(contig) = self.as_contiguous_slice() {
            return Image {
                width: self.width,
                height: self.height,
                data: contig.to_vec(),
            };
        }

        let mut data = Vec::with_capacity(self.len());
        for row in self.rows() {
            data.extend_from_slice(row);
        }
        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Row iterator over an [`ImageView`], top to bottom.
#[derive(Debug)]
pub struct Rows<'a, T> {
    view: ImageView<'a, T>,
    y: usize,
}

impl<'a, T> Iterator for Rows<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.view.height {
            return None;
        }
        let row = self.view.row(self.y);
        self.y += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.view.height - self.y;
        (left, Some(left))
    }
}

impl<T> ExactSizeIterator for Rows<'_, T> {}

fn min_required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(width)
}
