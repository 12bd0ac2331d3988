//! Buy/sell/hold rule.
//!
//! Rules are checked in order: buy, then sell, then hold. An absent debt
//! ratio satisfies the debt check of both buy and sell.

use fundlab_core::{BpaSignal, PerSignal, Recommendation};

use super::{RatioColumns, RecommendationColumn, SignalColumns};

const BUY_MAX_DEBT_RATIO: f64 = 6.0;
const SELL_MIN_DEBT_RATIO: f64 = 4.0;

pub fn recommend(per: PerSignal, bpa: BpaSignal, deuda_ebitda: Option<f64>) -> Recommendation {
    let per_ok = matches!(per, PerSignal::Cheap | PerSignal::Mid);
    let bpa_ok = matches!(bpa, BpaSignal::Mid | BpaSignal::High);
    if per_ok && bpa_ok && deuda_ebitda.map_or(true, |d| d <= BUY_MAX_DEBT_RATIO) {
        return Recommendation::Buy;
    }
    if per == PerSignal::Expensive
        && bpa == BpaSignal::Weak
        && deuda_ebitda.map_or(true, |d| d >= SELL_MIN_DEBT_RATIO)
    {
        return Recommendation::Sell;
    }
    Recommendation::Hold
}

/// Apply [`recommend`] row by row over the joined ratio and signal results.
pub fn recommend_all(ratios: &RatioColumns, signals: &SignalColumns) -> RecommendationColumn {
    let recommendation = signals
        .per_signal
        .iter()
        .zip(&signals.bpa_signal)
        .enumerate()
        .map(|(i, (&per, &bpa))| recommend(per, bpa, ratios.deuda_ebitda.get(i).copied().flatten()))
        .collect();
    RecommendationColumn { recommendation }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_cases() {
        assert_eq!(recommend(PerSignal::Cheap, BpaSignal::High, Some(5.0)), Recommendation::Buy);
        assert_eq!(recommend(PerSignal::Cheap, BpaSignal::High, Some(7.0)), Recommendation::Hold);
        assert_eq!(recommend(PerSignal::Expensive, BpaSignal::Weak, None), Recommendation::Sell);
        for debt in [None, Some(0.0), Some(5.0), Some(10.0)] {
            assert_eq!(recommend(PerSignal::Mid, BpaSignal::Weak, debt), Recommendation::Hold);
        }
    }

    #[test]
    fn debt_thresholds_are_inclusive() {
        assert_eq!(recommend(PerSignal::Mid, BpaSignal::Mid, Some(6.0)), Recommendation::Buy);
        assert_eq!(recommend(PerSignal::Expensive, BpaSignal::Weak, Some(4.0)), Recommendation::Sell);
        assert_eq!(recommend(PerSignal::Expensive, BpaSignal::Weak, Some(3.9)), Recommendation::Hold);
    }

    #[test]
    fn absent_debt_ratio_passes_buy_check() {
        assert_eq!(recommend(PerSignal::Cheap, BpaSignal::Mid, None), Recommendation::Buy);
    }

    #[test]
    fn unknown_signals_hold() {
        assert_eq!(recommend(PerSignal::Unknown, BpaSignal::Unknown, None), Recommendation::Hold);
    }

    #[test]
    fn recommend_all_is_row_aligned() {
        let ratios = RatioColumns {
            deuda_ebitda: vec![Some(2.0), None, Some(8.0)],
            ebitda_beneficio: vec![None, None, None],
        };
        let signals = SignalColumns {
            per_signal: vec![PerSignal::Cheap, PerSignal::Expensive, PerSignal::Mid],
            bpa_signal: vec![BpaSignal::High, BpaSignal::Weak, BpaSignal::Mid],
        };
        let column = recommend_all(&ratios, &signals);
        assert_eq!(
            column.recommendation,
            [Recommendation::Buy, Recommendation::Sell, Recommendation::Hold]
        );
    }
}
