//! Discount bands
//!
//! Bands are thresholds at multiples of 10 spanning the observed discount
//! range, e.g. `[25.89, 60.5]` becomes `30, 40, 50, 60`.

use crate::error::{Error, Result};

use super::entity::DiscountBand;

const STEP: i64 = 10;

/// Compute the discount bands covering `[min, max]` percent.
pub fn discount_bands(min: f64, max: f64) -> Result<Vec<DiscountBand>> {
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::InvalidInput(format!(
            "discount range must be finite, got [{}, {}]",
            min, max
        )));
    }
    if min < 0.0 || max >= 100.0 || min > max {
        return Err(Error::InvalidInput(format!(
            "discount range must satisfy 0 <= min <= max < 100, got [{}, {}]",
            min, max
        )));
    }

    let lower = round_up_to_step(min);
    let upper = round_up_to_step(max);

    Ok((lower.max(STEP)..=upper)
        .step_by(STEP as usize)
        .map(DiscountBand::new)
        .collect())
}

/// Smallest multiple of 10 that is >= the floor of `value`.
fn round_up_to_step(value: f64) -> i64 {
    let floor = value.floor() as i64;
    let range = value.trunc() as i64 - floor.rem_euclid(STEP);
    if range != floor { range + STEP } else { range }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(min: f64, max: f64) -> Vec<i64> {
        discount_bands(min, max)
            .unwrap()
            .into_iter()
            .map(|b| b.threshold)
            .collect()
    }

    #[test]
    fn test_bands_bracket_range() {
        assert_eq!(thresholds(25.89, 60.5), vec![30, 40, 50, 60]);
        assert_eq!(thresholds(10.0, 10.0), vec![10]);
        assert_eq!(thresholds(3.0, 7.0), vec![10]);
    }

    #[test]
    fn test_zero_threshold_never_emitted() {
        assert_eq!(
            thresholds(0.0, 95.0),
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
    }

    #[test]
    fn test_labels() {
        let bands = discount_bands(40.0, 50.0).unwrap();
        assert_eq!(bands[0].label, "<=40% off");
        assert_eq!(bands[1].label, "<=50% off");
    }

    #[test]
    fn test_out_of_range_rejected() {
        for (min, max) in [(-1.0, 10.0), (10.0, 100.0), (50.0, 20.0), (f64::NAN, 10.0)] {
            let err = discount_bands(min, max).unwrap_err();
            assert_eq!(err.code(), "E800", "[{}, {}] should be rejected", min, max);
        }
    }
}
