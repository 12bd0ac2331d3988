//! fundlab runner: collection pool, analysis graph, and run phases.
//!
//! This crate builds on `fundlab-core` to provide:
//! - Run configuration (TOML) and the on-disk artifact layout
//! - `BoundedWorkerPool`: concurrent fetch → extract → store under a cap
//! - `WorkingDataset` loading and joining
//! - `StageGraph`: the four analysis stages with two join points
//! - `merge`: deterministic assembly of the final table
//! - CSV/JSON export and the quotes/finances/analysis phases

pub mod config;
pub mod dataset;
pub mod export;
pub mod graph;
pub mod layout;
pub mod merge;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod stages;

pub use config::{ConfigError, QuoteBoardConfig, RunConfig};
pub use dataset::{load_working_dataset, DatasetError, WorkingDataset, WorkingRow};
pub use export::ExportError;
pub use graph::{GraphError, NoopObserver, StageGraph, StageObserver, StageState, StageTimeline};
pub use layout::ArtifactLayout;
pub use merge::{merge, FinalRow, FinalTable, MergeError};
pub use pipeline::{
    collect_finances, collect_quotes, is_missing_precondition, run_all, run_analysis,
    AnalysisReport, Collaborators, FinancesReport, QuotesReport, RunManifest, RunReport,
};
pub use pool::{BoundedWorkerPool, EntityError, PoolError, PoolOutcome};
pub use progress::{FetchProgress, SilentProgress, TracingProgress};
pub use stages::{StageKind, StageResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn dataset_is_shareable_across_stage_threads() {
        assert_send::<WorkingDataset>();
        assert_sync::<WorkingDataset>();
    }

    #[test]
    fn stage_results_cross_join_handles() {
        assert_send::<StageResults>();
        assert_send::<FinalTable>();
    }

    #[test]
    fn observers_are_sync() {
        assert_sync::<StageTimeline>();
        assert_sync::<TracingProgress>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<EntityError>();
        assert_sync::<EntityError>();
        assert_send::<GraphError>();
        assert_sync::<GraphError>();
    }
}
