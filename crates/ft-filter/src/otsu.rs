use crate::histogram::Histogram;

/// Global threshold maximizing the between-class variance of the histogram.
///
/// Values `<= t` form the dark class and values `> t` the light class. Only a
/// strictly greater variance replaces the current best, so ties resolve to the
/// lowest `t`. When every value lands in a single bin no split ever has two
/// non-empty classes and the result is 0.
pub fn otsu_threshold(hist: &Histogram) -> u8 {
    let total = hist.total() as f64;
    let bins = hist.bins();

    let mut sum_total = 0f64;
    for (i, &h) in bins.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = 0f64;
    let mut best_t = 0u8;

    for (t, &h) in bins.iter().enumerate() {
        w_b += h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}
