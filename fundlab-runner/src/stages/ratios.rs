//! Debt and earnings ratios.

use super::RatioColumns;
use crate::dataset::WorkingDataset;

/// `numerator / denominator`, or `None` when either operand is absent, the
/// denominator is zero, or the quotient is not finite.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    Some(n / d).filter(|q| q.is_finite())
}

pub fn compute_ratios(dataset: &WorkingDataset) -> RatioColumns {
    let rows = dataset.rows();
    RatioColumns {
        deuda_ebitda: rows.iter().map(|r| safe_ratio(r.fields.deuda, r.fields.ebitda)).collect(),
        ebitda_beneficio: rows
            .iter()
            .map(|r| safe_ratio(r.fields.ebitda, r.fields.beneficio))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_and_missing_denominators_are_absent() {
        assert_eq!(safe_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(safe_ratio(Some(10.0), Some(-0.0)), None);
        assert_eq!(safe_ratio(None, Some(2.0)), None);
        assert_eq!(safe_ratio(Some(10.0), None), None);
        assert_eq!(safe_ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(safe_ratio(Some(0.0), Some(4.0)), Some(0.0));
    }

    #[test]
    fn nan_operands_are_absent() {
        assert_eq!(safe_ratio(Some(f64::NAN), Some(2.0)), None);
        assert_eq!(safe_ratio(Some(1.0), Some(f64::NAN)), None);
    }

    proptest! {
        #[test]
        fn ratio_absent_iff_operand_missing_or_zero(
            deuda in proptest::option::of(-1e9f64..1e9),
            ebitda in proptest::option::of(prop_oneof![Just(0.0f64), 1.0f64..1e9, -1e9f64..-1.0]),
        ) {
            let ratio = safe_ratio(deuda, ebitda);
            match (deuda, ebitda) {
                (Some(n), Some(d)) if d != 0.0 => prop_assert_eq!(ratio, Some(n / d)),
                _ => prop_assert_eq!(ratio, None),
            }
        }
    }
}
