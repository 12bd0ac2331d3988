//! Progress collectors injected into the collection pool.
//!
//! Callbacks fire from collection threads, so implementations must be
//! `Sync`. Completion order is unspecified.

use fundlab_core::Entity;

use crate::pool::EntityError;

/// Per-entity progress callbacks for one pool run.
pub trait FetchProgress: Sync {
    /// Called when a task acquires a slot and starts fetching.
    fn on_start(&self, entity: &Entity, index: usize, total: usize);

    /// Called when a task finishes, successfully or not.
    fn on_complete(
        &self,
        entity: &Entity,
        index: usize,
        total: usize,
        result: &Result<(), EntityError>,
    );

    /// Called once after every task has finished.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Reports progress through `tracing`.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, entity: &Entity, index: usize, total: usize) {
        tracing::info!(ticker = %entity.ticker, "[{}/{}] collecting {}", index + 1, total, entity.name);
    }

    fn on_complete(
        &self,
        entity: &Entity,
        _index: usize,
        _total: usize,
        result: &Result<(), EntityError>,
    ) {
        match result {
            Ok(()) => tracing::info!(ticker = %entity.ticker, "stored snapshot for {}", entity.name),
            Err(e) => tracing::error!(
                ticker = %entity.ticker,
                kind = e.kind(),
                "failed collecting {}: {e}",
                entity.name
            ),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "collection complete");
    }
}

/// Discards all progress.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _entity: &Entity, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _entity: &Entity,
        _index: usize,
        _total: usize,
        _result: &Result<(), EntityError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
