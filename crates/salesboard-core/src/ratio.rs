//! Division with an explicit zero-denominator case.

/// `numerator / denominator`, or `None` when the denominator is zero.
///
/// Every ratio reported by the dashboard goes through this helper so that
/// empty selections never produce `NaN` or infinities.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// `numerator / denominator * 100`, or `None` when the denominator is zero.
pub fn safe_percent(numerator: f64, denominator: f64) -> Option<f64> {
    safe_ratio(numerator, denominator).map(|r| r * 100.0)
}
