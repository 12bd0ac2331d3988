//! The four analysis stages and their typed results.
//!
//! Each stage is a pure function over the working dataset (or over other
//! stages' results) returning one row-aligned result. The graph owns
//! scheduling; nothing here synchronizes.

pub mod ratios;
pub mod raw_merge;
pub mod recommendation;
pub mod signals;

use std::fmt;
use std::path::PathBuf;

use fundlab_core::{BpaSignal, PerSignal, Recommendation};

pub use ratios::{compute_ratios, safe_ratio};
pub use raw_merge::persist_raw_merge;
pub use recommendation::{recommend, recommend_all};
pub use signals::{classify_bpa, classify_per, compute_signals};

/// Identifies a stage in the graph, in logs and in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Ratios,
    Signals,
    Recommendation,
    RawMerge,
}

impl StageKind {
    pub const ALL: [StageKind; 4] =
        [StageKind::Ratios, StageKind::Signals, StageKind::Recommendation, StageKind::RawMerge];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ratios => "ratios",
            Self::Signals => "signals",
            Self::Recommendation => "recommendation",
            Self::RawMerge => "raw_merge",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ratio stage output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioColumns {
    pub deuda_ebitda: Vec<Option<f64>>,
    pub ebitda_beneficio: Vec<Option<f64>>,
}

/// Signal stage output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalColumns {
    pub per_signal: Vec<PerSignal>,
    pub bpa_signal: Vec<BpaSignal>,
}

/// Recommendation stage output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationColumn {
    pub recommendation: Vec<Recommendation>,
}

/// Where the raw-merge stage wrote the working dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMergeArtifact {
    pub path: PathBuf,
    pub rows: usize,
}

/// One write-once slot per stage.
///
/// The graph fills each slot from the stage's joined thread handle, so a
/// slot is only ever populated with a finished result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageResults {
    ratios: Option<RatioColumns>,
    signals: Option<SignalColumns>,
    recommendation: Option<RecommendationColumn>,
    raw_merge: Option<RawMergeArtifact>,
}

impl StageResults {
    pub fn with_ratios(mut self, ratios: RatioColumns) -> Self {
        self.ratios = Some(ratios);
        self
    }

    pub fn with_signals(mut self, signals: SignalColumns) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn with_recommendation(mut self, recommendation: RecommendationColumn) -> Self {
        self.recommendation = Some(recommendation);
        self
    }

    pub fn with_raw_merge(mut self, artifact: RawMergeArtifact) -> Self {
        self.raw_merge = Some(artifact);
        self
    }

    pub fn ratios(&self) -> Option<&RatioColumns> {
        self.ratios.as_ref()
    }

    pub fn signals(&self) -> Option<&SignalColumns> {
        self.signals.as_ref()
    }

    pub fn recommendation(&self) -> Option<&RecommendationColumn> {
        self.recommendation.as_ref()
    }

    pub fn raw_merge(&self) -> Option<&RawMergeArtifact> {
        self.raw_merge.as_ref()
    }

    /// True once every stage has published.
    pub fn is_complete(&self) -> bool {
        self.ratios.is_some()
            && self.signals.is_some()
            && self.recommendation.is_some()
            && self.raw_merge.is_some()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<RatioColumns>,
        Option<SignalColumns>,
        Option<RecommendationColumn>,
        Option<RawMergeArtifact>,
    ) {
        (self.ratios, self.signals, self.recommendation, self.raw_merge)
    }
}
