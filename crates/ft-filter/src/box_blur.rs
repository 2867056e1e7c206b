use ft_core::{Image, ImageView};

/// Radius of the default 7x7 averaging window.
pub const DEFAULT_BLUR_RADIUS: usize = 3;

/// Square mean filter of the given radius.
///
/// Near the borders the window is clipped to in-bounds pixels and the mean is
/// taken over the pixels that remain, so edges are neither wrapped nor pulled
/// toward zero. Output values are not re-clamped.
///
/// The clipped window is always a row range times a column range, so the
/// filter runs as a horizontal pass followed by a vertical pass over running
/// sums, O(1) per pixel regardless of radius.
pub fn box_blur_f32(src: &ImageView<'_, f32>, radius: usize) -> Image<f32> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 || radius == 0 {
        return src.to_image();
    }

    let mut prefix = Vec::with_capacity(w.max(h) + 1);

    let mut horiz = Image::new_fill(w, h, 0.0f32);
    for (y, row) in src.rows().enumerate() {
        clipped_mean_1d(row, radius, &mut prefix, horiz.row_mut(y));
    }

    let mut out = Image::new_fill(w, h, 0.0f32);
    let mut col = vec![0.0f32; h];
    let mut col_out = vec![0.0f32; h];
    for x in 0..w {
        for (y, dst) in col.iter_mut().enumerate() {
            *dst = horiz.data()[y * w + x];
        }
        clipped_mean_1d(&col, radius, &mut prefix, &mut col_out);
        let data = out.data_mut();
        for (y, &v) in col_out.iter().enumerate() {
            data[y * w + x] = v;
        }
    }

    out
}

fn clipped_mean_1d(signal: &[f32], radius: usize, prefix: &mut Vec<f64>, out: &mut [f32]) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    let n = signal.len();

    prefix.clear();
    prefix.push(0.0);
    let mut acc = 0.0f64;
    for &v in signal {
        acc += v as f64;
        prefix.push(acc);
    }

    for (i, dst) in out.iter_mut().enumerate() {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(n);
        *dst = ((prefix[hi] - prefix[lo]) / (hi - lo) as f64) as f32;
    }
}

#[cfg(test)]
mod tests {
    use ft_core::Image;

    use super::{DEFAULT_BLUR_RADIUS, box_blur_f32};

    fn brute_force(img: &Image<f32>, radius: usize) -> Vec<f32> {
        let (w, h) = (img.width(), img.height());
        let mut out = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let (y0, y1) = (y.saturating_sub(radius), (y + radius).min(h - 1));
                let (x0, x1) = (x.saturating_sub(radius), (x + radius).min(w - 1));
                let mut sum = 0.0f64;
                let mut count = 0usize;
                for yy in y0..=y1 {
                    for xx in x0..=x1 {
                        sum += img.data()[yy * w + xx] as f64;
                        count += 1;
                    }
                }
                out.push((sum / count as f64) as f32);
            }
        }
        out
    }

    #[test]
    fn uniform_field_is_unchanged() {
        let img = Image::new_fill(9, 6, 128.0f32);
        let out = box_blur_f32(&img.as_view(), DEFAULT_BLUR_RADIUS);
        assert!(out.data().iter().all(|&v| v == 128.0));
    }

    #[test]
    fn interior_impulse_spreads_over_window() {
        let mut img = Image::new_fill(11, 11, 0.0f32);
        img.data_mut()[5 * 11 + 5] = 49.0;
        let out = box_blur_f32(&img.as_view(), 3);

        assert!((out.data()[5 * 11 + 5] - 1.0).abs() < 1e-6);
        assert!((out.data()[2 * 11 + 8] - 1.0).abs() < 1e-6);
        assert_eq!(out.data()[11 + 5], 0.0);
    }

    #[test]
    fn corner_averages_only_in_bounds_pixels() {
        let img = Image::from_vec(3, 3, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
            .expect("valid image");
        let out = box_blur_f32(&img.as_view(), 1);

        // Top-left window covers {1, 2, 4, 5}.
        assert!((out.data()[0] - 3.0).abs() < 1e-6);
        // Centre sees the whole image.
        assert!((out.data()[4] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn matches_direct_clipped_mean() {
        let (w, h) = (23usize, 17usize);
        let data = (0..w * h)
            .map(|i| ((i * 37 + 11) % 251) as f32)
            .collect();
        let img = Image::from_vec(w, h, data).expect("valid image");

        let fast = box_blur_f32(&img.as_view(), DEFAULT_BLUR_RADIUS);
        let slow = brute_force(&img, DEFAULT_BLUR_RADIUS);
        for (a, b) in fast.data().iter().zip(slow.iter()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn zero_radius_is_identity() {
        let img = Image::from_vec(2, 2, vec![1.0f32, 5.0, 9.0, 2.0]).expect("valid image");
        assert_eq!(box_blur_f32(&img.as_view(), 0), img);
    }
}
