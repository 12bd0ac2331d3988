//! Assemble the final table from the joined stage results.

use std::collections::BTreeMap;

use fundlab_core::{BpaSignal, PerSignal, Recommendation};
use thiserror::Error;

use crate::dataset::{WorkingDataset, WorkingRow};
use crate::stages::{StageKind, StageResults};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("stage result missing for {0}")]
    MissingStageResult(StageKind),

    #[error("{stage} produced {actual} rows, expected {expected}")]
    RowCountMismatch { stage: StageKind, expected: usize, actual: usize },
}

/// A working row with every derived column appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalRow {
    pub base: WorkingRow,
    pub deuda_ebitda: Option<f64>,
    pub ebitda_beneficio: Option<f64>,
    pub per_signal: PerSignal,
    pub bpa_signal: BpaSignal,
    pub recommendation: Recommendation,
}

/// The merged output table, in working dataset row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalTable {
    rows: Vec<FinalRow>,
}

impl FinalTable {
    pub fn rows(&self) -> &[FinalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows per recommendation, zero counts included.
    pub fn recommendation_counts(&self) -> BTreeMap<Recommendation, usize> {
        let mut counts: BTreeMap<Recommendation, usize> =
            [Recommendation::Buy, Recommendation::Sell, Recommendation::Hold]
                .into_iter()
                .map(|r| (r, 0))
                .collect();
        for row in &self.rows {
            *counts.entry(row.recommendation).or_default() += 1;
        }
        counts
    }
}

/// Append ratios, then signals, then the recommendation to every base row.
///
/// Requires every stage's result, raw merge included, and every column to
/// match the base row count.
pub fn merge(base: WorkingDataset, results: StageResults) -> Result<FinalTable, MergeError> {
    let (ratios, signals, recommendation, raw_merge) = results.into_parts();
    let ratios = ratios.ok_or(MergeError::MissingStageResult(StageKind::Ratios))?;
    let signals = signals.ok_or(MergeError::MissingStageResult(StageKind::Signals))?;
    let recommendation =
        recommendation.ok_or(MergeError::MissingStageResult(StageKind::Recommendation))?;
    raw_merge.ok_or(MergeError::MissingStageResult(StageKind::RawMerge))?;

    let expected = base.len();
    let check = |stage, actual| {
        if actual == expected {
            Ok(())
        } else {
            Err(MergeError::RowCountMismatch { stage, expected, actual })
        }
    };
    check(StageKind::Ratios, ratios.deuda_ebitda.len())?;
    check(StageKind::Ratios, ratios.ebitda_beneficio.len())?;
    check(StageKind::Signals, signals.per_signal.len())?;
    check(StageKind::Signals, signals.bpa_signal.len())?;
    check(StageKind::Recommendation, recommendation.recommendation.len())?;

    let rows = base
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| FinalRow {
            base: row.clone(),
            deuda_ebitda: ratios.deuda_ebitda[i],
            ebitda_beneficio: ratios.ebitda_beneficio[i],
            per_signal: signals.per_signal[i],
            bpa_signal: signals.bpa_signal[i],
            recommendation: recommendation.recommendation[i],
        })
        .collect();
    Ok(FinalTable { rows })
}
