//! Dependency-ordered execution of the analysis stages.
//!
//! ```text
//!   Ratios ─┐                ┌─ Recommendation ─┐
//!           ├─ join₁ ────────┤                  ├─ join₂ → StageResults
//!  Signals ─┘                └─ RawMerge ───────┘
//! ```
//!
//! Each stage runs on its own scoped thread and hands its result back
//! through the join handle, so a result becomes visible to the
//! coordinating thread only once its stage has finished. Recommendation
//! reads the joined Ratios and Signals results; RawMerge has no data
//! dependency and is held back to the second group to keep at most two
//! stages running at a time.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::dataset::WorkingDataset;
use crate::export::ExportError;
use crate::pool::panic_message;
use crate::stages::{
    compute_ratios, compute_signals, persist_raw_merge, recommend_all, StageKind, StageResults,
};

/// Fatal errors from a graph run.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cannot start {stage} stage: {source}")]
    Spawn {
        stage: StageKind,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage panicked: {message}")]
    StagePanicked { stage: StageKind, message: String },

    #[error("raw merge stage failed: {0}")]
    RawMerge(#[from] ExportError),
}

/// Stage lifecycle callbacks.
///
/// `on_stage_start` fires on the stage's own thread before it does any
/// work; `on_stage_joined` fires on the coordinating thread once the join
/// has returned.
pub trait StageObserver: Sync {
    fn on_stage_start(&self, _stage: StageKind) {}
    fn on_stage_joined(&self, _stage: StageKind) {}
}

pub struct NoopObserver;

impl StageObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Joined,
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Started,
    Joined,
}

/// Records when each stage started and joined.
#[derive(Debug, Default)]
pub struct StageTimeline {
    events: Mutex<Vec<(StageKind, Event, Instant)>>,
}

impl StageTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self, stage: StageKind) -> Option<Instant> {
        self.find(stage, |e| matches!(e, Event::Started))
    }

    pub fn joined_at(&self, stage: StageKind) -> Option<Instant> {
        self.find(stage, |e| matches!(e, Event::Joined))
    }

    pub fn state(&self, stage: StageKind) -> StageState {
        match (self.started_at(stage), self.joined_at(stage)) {
            (_, Some(_)) => StageState::Joined,
            (Some(_), None) => StageState::Running,
            (None, None) => StageState::Pending,
        }
    }

    /// Start-to-join time of every joined stage, in stage order.
    pub fn durations(&self) -> Vec<(StageKind, Duration)> {
        StageKind::ALL
            .into_iter()
            .filter_map(|stage| {
                let start = self.started_at(stage)?;
                let joined = self.joined_at(stage)?;
                Some((stage, joined.saturating_duration_since(start)))
            })
            .collect()
    }

    fn find(&self, stage: StageKind, wanted: impl Fn(Event) -> bool) -> Option<Instant> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().find(|(s, e, _)| *s == stage && wanted(*e)).map(|(_, _, at)| *at)
    }

    fn record(&self, stage: StageKind, event: Event) {
        let now = Instant::now();
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push((stage, event, now));
    }
}

impl StageObserver for StageTimeline {
    fn on_stage_start(&self, stage: StageKind) {
        self.record(stage, Event::Started);
    }

    fn on_stage_joined(&self, stage: StageKind) {
        self.record(stage, Event::Joined);
    }
}

/// The four-stage analysis graph.
pub struct StageGraph<'a> {
    raw_merge_path: PathBuf,
    observer: &'a dyn StageObserver,
}

impl<'a> StageGraph<'a> {
    /// `raw_merge_path` is where the RawMerge stage writes the dataset.
    pub fn new(raw_merge_path: impl Into<PathBuf>) -> Self {
        Self { raw_merge_path: raw_merge_path.into(), observer: &NoopObserver }
    }

    pub fn with_observer(mut self, observer: &'a dyn StageObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run every stage over `dataset`. Any stage failure is fatal.
    pub fn run(&self, dataset: &WorkingDataset) -> Result<StageResults, GraphError> {
        let observer = self.observer;

        let (ratios, signals) = thread::scope(|s| -> Result<_, GraphError> {
            let ratios = spawn_stage(s, observer, StageKind::Ratios, || compute_ratios(dataset));
            let signals = spawn_stage(s, observer, StageKind::Signals, || compute_signals(dataset));
            self.join_pair((StageKind::Ratios, ratios), (StageKind::Signals, signals))
        })?;

        let (recommendation, raw_merge) = thread::scope(|s| -> Result<_, GraphError> {
            let recommendation = spawn_stage(s, observer, StageKind::Recommendation, || {
                recommend_all(&ratios, &signals)
            });
            let raw_merge = spawn_stage(s, observer, StageKind::RawMerge, || {
                persist_raw_merge(dataset, &self.raw_merge_path)
            });
            let (recommendation, raw_merge) = self.join_pair(
                (StageKind::Recommendation, recommendation),
                (StageKind::RawMerge, raw_merge),
            )?;
            Ok((recommendation, raw_merge?))
        })?;

        tracing::debug!(rows = dataset.len(), "analysis stages joined");
        Ok(StageResults::default()
            .with_ratios(ratios)
            .with_signals(signals)
            .with_recommendation(recommendation)
            .with_raw_merge(raw_merge))
    }

    /// Join both halves of a group, even when one of them never started,
    /// so a failure in one surfaces as an error rather than a scope panic.
    fn join_pair<'scope, A, B>(
        &self,
        first: (StageKind, Result<ScopedJoinHandle<'scope, A>, GraphError>),
        second: (StageKind, Result<ScopedJoinHandle<'scope, B>, GraphError>),
    ) -> Result<(A, B), GraphError> {
        let a = first.1.and_then(|handle| self.join_stage(first.0, handle));
        let b = second.1.and_then(|handle| self.join_stage(second.0, handle));
        Ok((a?, b?))
    }

    fn join_stage<T>(&self, stage: StageKind, handle: ScopedJoinHandle<'_, T>) -> Result<T, GraphError> {
        let output = handle
            .join()
            .map_err(|payload| GraphError::StagePanicked { stage, message: panic_message(payload.as_ref()) })?;
        self.observer.on_stage_joined(stage);
        Ok(output)
    }
}

fn spawn_stage<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    observer: &'scope dyn StageObserver,
    stage: StageKind,
    work: F,
) -> Result<ScopedJoinHandle<'scope, T>, GraphError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(format!("fundlab-stage-{stage}"))
        .spawn_scoped(scope, move || {
            observer.on_stage_start(stage);
            work()
        })
        .map_err(|source| GraphError::Spawn { stage, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::RatioColumns;

    #[test]
    fn started_stage_is_joined_when_its_sibling_cannot_start() {
        let graph = StageGraph::new("dataset_joined.csv");
        let observer: &dyn StageObserver = &NoopObserver;

        let result = thread::scope(|s| {
            let ratios = spawn_stage(s, observer, StageKind::Ratios, || -> RatioColumns {
                panic!("ratio stage failed")
            });
            let signals: Result<ScopedJoinHandle<'_, ()>, GraphError> = Err(GraphError::Spawn {
                stage: StageKind::Signals,
                source: std::io::Error::other("thread limit reached"),
            });
            graph.join_pair((StageKind::Ratios, ratios), (StageKind::Signals, signals))
        });

        assert!(matches!(result, Err(GraphError::StagePanicked { stage: StageKind::Ratios, .. })));
    }

    #[test]
    fn spawn_error_surfaces_after_sibling_finishes() {
        let graph = StageGraph::new("dataset_joined.csv");
        let observer: &dyn StageObserver = &NoopObserver;

        let result = thread::scope(|s| {
            let ratios: Result<ScopedJoinHandle<'_, ()>, GraphError> = Err(GraphError::Spawn {
                stage: StageKind::Ratios,
                source: std::io::Error::other("thread limit reached"),
            });
            let signals = spawn_stage(s, observer, StageKind::Signals, || 7);
            graph.join_pair((StageKind::Ratios, ratios), (StageKind::Signals, signals))
        });

        assert!(matches!(result, Err(GraphError::Spawn { stage: StageKind::Ratios, .. })));
    }

    #[test]
    fn timeline_states_follow_events() {
        let timeline = StageTimeline::new();
        assert_eq!(timeline.state(StageKind::Ratios), StageState::Pending);
        timeline.on_stage_start(StageKind::Ratios);
        assert_eq!(timeline.state(StageKind::Ratios), StageState::Running);
        timeline.on_stage_joined(StageKind::Ratios);
        assert_eq!(timeline.state(StageKind::Ratios), StageState::Joined);
        assert_eq!(timeline.durations().len(), 1);
        assert_eq!(timeline.state(StageKind::Signals), StageState::Pending);
    }
}
