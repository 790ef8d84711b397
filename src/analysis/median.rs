//! Median filter - outlier suppression for pitch tracks
//!
//! Absent values are represented as `NaN` and never take part in the
//! median. Windows are clipped at the sequence edges, so the output always
//! has the same length as the input.

/// Apply a sliding median of `width` over `values`
///
/// An even `width` is widened by one to keep the window centred. Each output
/// entry is the lower median of the finite values inside its clipped window,
/// or `NaN` when the window holds none.
pub fn median_filter(values: &[f32], width: usize) -> Vec<f32> {
    let width = if width % 2 == 0 { width + 1 } else { width };
    let half = width / 2;

    let mut window: Vec<f32> = Vec::with_capacity(width);
    let mut output = Vec::with_capacity(values.len());

    for index in 0..values.len() {
        let lo = index.saturating_sub(half);
        let hi = (index + half + 1).min(values.len());

        window.clear();
        window.extend(values[lo..hi].iter().copied().filter(|v| v.is_finite()));

        if window.is_empty() {
            output.push(f32::NAN);
            continue;
        }

        window.sort_unstable_by(|a, b| a.total_cmp(b));
        output.push(window[(window.len() - 1) / 2]);
    }

    output
}
