//! Period-over-period and compound growth.

/// Growth from `previous` to `current`, as a fraction of `previous`.
///
/// `None` when either value is non-finite or `previous` is zero.
#[must_use]
pub fn yoy(current: f64, previous: f64) -> Option<f64> {
    if !current.is_finite() || !previous.is_finite() || previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous)
}

/// Compound growth rate over `periods`, from values ordered oldest to newest.
///
/// Uses the newest value and the value `periods` steps before it:
/// `(newest / oldest)^(1 / periods) - 1`. Requires at least `periods + 1`
/// values; a zero or negative starting value, or a negative end value, gives
/// `None`.
#[must_use]
pub fn cagr(values: &[f64], periods: usize) -> Option<f64> {
    if periods == 0 || values.len() < periods + 1 {
        return None;
    }
    let newest = *values.last()?;
    let oldest = values[values.len() - 1 - periods];
    if !oldest.is_finite() || !newest.is_finite() || oldest <= 0.0 || newest < 0.0 {
        return None;
    }

    let rate = (newest / oldest).powf(1.0 / periods as f64) - 1.0;
    rate.is_finite().then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yoy() {
        assert_eq!(yoy(110.0, 100.0), Some(0.1));
        assert_eq!(yoy(90.0, 100.0), Some(-0.1));
        assert_eq!(yoy(1.0, 0.0), None);
        assert_eq!(yoy(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_cagr_doubling_over_two_periods() {
        let rate = cagr(&[100.0, 150.0, 400.0], 2).unwrap();
        assert!((rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cagr_uses_trailing_window() {
        // Only the last periods + 1 values count.
        let rate = cagr(&[1.0, 100.0, 121.0], 1).unwrap();
        assert!((rate - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_cagr_requires_enough_values() {
        assert_eq!(cagr(&[100.0, 110.0], 2), None);
        assert_eq!(cagr(&[100.0], 0), None);
    }

    #[test]
    fn test_cagr_rejects_non_positive_start() {
        assert_eq!(cagr(&[0.0, 50.0, 100.0], 2), None);
        assert_eq!(cagr(&[-10.0, 50.0, 100.0], 2), None);
    }
}
