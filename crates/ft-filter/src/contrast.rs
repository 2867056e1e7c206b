use ft_core::{Image, ImageView};

/// Smallest and largest value, or `None` for an empty slice. NaNs are skipped.
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in values {
        if v < min_v {
            min_v = v;
        }
        if v > max_v {
            max_v = v;
        }
    }

    (min_v <= max_v).then_some((min_v, max_v))
}

/// Linearly rescales the field so its minimum maps to 0 and its maximum to 255.
///
/// A perfectly uniform field is returned unchanged; the flat signal it
/// produces is rejected further down the pipeline, not here.
pub fn stretch_contrast(src: &ImageView<'_, f32>) -> Image<f32> {
    let field = src.to_image();
    let Some((min_v, max_v)) = min_max(field.data()) else {
        return field;
    };

    if max_v == min_v {
        return field;
    }

    let scale = 255.0 / (max_v - min_v);
    field.map(|&v| (v - min_v) * scale)
}
