//! Valuation and earnings bands.

use fundlab_core::{BpaSignal, PerSignal};

use super::SignalColumns;
use crate::dataset::WorkingDataset;

const PER_CHEAP_BELOW: f64 = 12.0;
const PER_MID_BELOW: f64 = 20.0;
const BPA_WEAK_BELOW: f64 = 0.5;
const BPA_MID_BELOW: f64 = 1.5;

pub fn classify_per(per: Option<f64>) -> PerSignal {
    match per {
        Some(v) if v.is_nan() => PerSignal::Unknown,
        Some(v) if v < PER_CHEAP_BELOW => PerSignal::Cheap,
        Some(v) if v < PER_MID_BELOW => PerSignal::Mid,
        Some(_) => PerSignal::Expensive,
        None => PerSignal::Unknown,
    }
}

pub fn classify_bpa(bpa: Option<f64>) -> BpaSignal {
    match bpa {
        Some(v) if v.is_nan() => BpaSignal::Unknown,
        Some(v) if v < BPA_WEAK_BELOW => BpaSignal::Weak,
        Some(v) if v < BPA_MID_BELOW => BpaSignal::Mid,
        Some(_) => BpaSignal::High,
        None => BpaSignal::Unknown,
    }
}

pub fn compute_signals(dataset: &WorkingDataset) -> SignalColumns {
    let rows = dataset.rows();
    SignalColumns {
        per_signal: rows.iter().map(|r| classify_per(r.fields.per)).collect(),
        bpa_signal: rows.iter().map(|r| classify_bpa(r.fields.bpa)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn per_boundaries() {
        assert_eq!(classify_per(Some(11.9)), PerSignal::Cheap);
        assert_eq!(classify_per(Some(12.0)), PerSignal::Mid);
        assert_eq!(classify_per(Some(19.99)), PerSignal::Mid);
        assert_eq!(classify_per(Some(20.0)), PerSignal::Expensive);
        assert_eq!(classify_per(None), PerSignal::Unknown);
        assert_eq!(classify_per(Some(f64::NAN)), PerSignal::Unknown);
    }

    #[test]
    fn bpa_boundaries() {
        assert_eq!(classify_bpa(Some(0.49)), BpaSignal::Weak);
        assert_eq!(classify_bpa(Some(0.5)), BpaSignal::Mid);
        assert_eq!(classify_bpa(Some(1.5)), BpaSignal::High);
        assert_eq!(classify_bpa(Some(-2.0)), BpaSignal::Weak);
        assert_eq!(classify_bpa(None), BpaSignal::Unknown);
    }

    proptest! {
        #[test]
        fn per_bands_are_monotonic(a in -100.0f64..100.0, b in -100.0f64..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let rank = |s: PerSignal| match s {
                PerSignal::Cheap => 0,
                PerSignal::Mid => 1,
                PerSignal::Expensive => 2,
                PerSignal::Unknown => unreachable!(),
            };
            prop_assert!(rank(classify_per(Some(lo))) <= rank(classify_per(Some(hi))));
        }
    }
}
