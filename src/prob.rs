//! Log-space probability helpers.
//!
//! Probabilities are stored as base-2 logarithms. Zero maps to negative
//! infinity without ever evaluating `log2(0)`, and negative infinity maps back
//! to exactly `0.0`.

/// Convert a linear-scale probability to log2 space.
///
/// Anything that is not strictly positive becomes `-inf`; callers validate
/// the range beforehand.
#[inline]
pub fn to_log2(p: f64) -> f64 {
    if p > 0.0 {
        p.log2()
    } else {
        f64::NEG_INFINITY
    }
}

/// Convert a log2 probability back to linear scale.
#[inline]
pub fn from_log2(log_p: f64) -> f64 {
    if log_p == f64::NEG_INFINITY {
        0.0
    } else {
        log_p.exp2()
    }
}

/// Returns true if `p` is a usable probability: finite and within `[0, 1]`.
#[inline]
pub fn is_probability(p: f64) -> bool {
    p.is_finite() && (0.0..=1.0).contains(&p)
}

/// Index and value of the maximum, where the first-seen element wins ties.
///
/// The fold starts from the first element rather than from `-inf`, so a
/// sequence made only of `-inf` still yields index 0. Returns `None` for an
/// empty input.
pub fn argmax_first<I>(values: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .enumerate()
        .fold(None, |best, (idx, v)| match best {
            Some((_, best_v)) if v <= best_v => best,
            _ => Some((idx, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_maps_to_neg_infinity_and_back() {
        assert_eq!(to_log2(0.0), f64::NEG_INFINITY);
        assert_eq!(from_log2(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn round_trip_is_exact_for_powers_of_two() {
        for p in [1.0, 0.5, 0.25, 0.125, 1.0 / 1024.0] {
            assert_eq!(from_log2(to_log2(p)), p);
        }
    }

    #[test]
    fn round_trip_within_tolerance() {
        for p in [0.9, 0.3, 0.1, 1e-12] {
            let back = from_log2(to_log2(p));
            assert!((back - p).abs() <= p * 1e-12, "{p} came back as {back}");
        }
    }

    #[test]
    fn probability_range_check() {
        assert!(is_probability(0.0));
        assert!(is_probability(1.0));
        assert!(!is_probability(-0.1));
        assert!(!is_probability(1.5));
        assert!(!is_probability(f64::NAN));
        assert!(!is_probability(f64::INFINITY));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax_first([1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
        assert_eq!(argmax_first([-2.0, -2.0]), Some((0, -2.0)));
    }

    #[test]
    fn argmax_all_neg_infinity_picks_first() {
        let v = [f64::NEG_INFINITY; 3];
        assert_eq!(argmax_first(v), Some((0, f64::NEG_INFINITY)));
    }

    #[test]
    fn argmax_empty_is_none() {
        assert_eq!(argmax_first(std::iter::empty()), None);
    }
}
