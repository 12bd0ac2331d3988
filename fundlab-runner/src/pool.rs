//! Bounded collection pool.
//!
//! One task per entity runs on a private rayon pool sized to the
//! concurrency ceiling, so at most `concurrency` fetch → extract → write
//! sequences are in flight; the rest queue until a worker frees up. Each
//! task's failure is caught at the task boundary and recorded against its
//! entity; siblings keep running. `run` returns only after every task has
//! reported.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use fundlab_core::{
    Entity, ExtractionError, FetchError, FieldExtractor, FinancialSnapshot, PageFetcher,
    SnapshotWriter, StoreError,
};
use thiserror::Error;

use crate::progress::{FetchProgress, SilentProgress};

/// Why one entity's collection failed. Never fatal to the pool.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    StoreWrite(#[from] StoreError),

    #[error("collection task panicked: {0}")]
    Panicked(String),
}

impl EntityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::Extraction(e) => e.kind(),
            Self::StoreWrite(e) => e.kind(),
            Self::Panicked(_) => "task_panicked",
        }
    }
}

/// Errors that stop the pool before any task runs.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("failed to build collection threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What a pool run produced.
#[derive(Debug, Default)]
pub struct PoolOutcome {
    pub total: usize,
    /// Snapshots appended to the store.
    pub written: usize,
    /// Failed entities in configuration order.
    pub failures: Vec<(Entity, EntityError)>,
}

impl PoolOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one fetch → extract → append task per entity under a concurrency cap.
pub struct BoundedWorkerPool<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn FieldExtractor,
    store: &'a dyn SnapshotWriter,
    progress: &'a dyn FetchProgress,
}

impl<'a> BoundedWorkerPool<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn FieldExtractor,
        store: &'a dyn SnapshotWriter,
    ) -> Self {
        Self { fetcher, extractor, store, progress: &SilentProgress }
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Collect every entity with at most `concurrency` tasks active at once.
    pub fn run(&self, entities: &[Entity], concurrency: usize) -> Result<PoolOutcome, PoolError> {
        if concurrency == 0 {
            return Err(PoolError::InvalidConcurrency(concurrency));
        }
        let total = entities.len();
        if total == 0 {
            return Ok(PoolOutcome::default());
        }

        // Never more workers than tasks.
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.min(total))
            .thread_name(|i| format!("fundlab-collect-{i}"))
            .build()?;

        let (tx, rx) = mpsc::channel();
        workers.scope(|s| {
            for (index, entity) in entities.iter().enumerate() {
                let tx = tx.clone();
                s.spawn(move |_| {
                    self.progress.on_start(entity, index, total);
                    let result = self.collect_isolated(entity);
                    self.progress.on_complete(entity, index, total, &result);
                    // The receiver outlives the scope.
                    let _ = tx.send((index, result));
                });
            }
        });
        drop(tx);

        let mut results: Vec<(usize, Result<(), EntityError>)> = rx.into_iter().collect();
        results.sort_by_key(|(index, _)| *index);

        let mut outcome = PoolOutcome { total, ..Default::default() };
        for (index, result) in results {
            match result {
                Ok(()) => outcome.written += 1,
                Err(e) => outcome.failures.push((entities[index].clone(), e)),
            }
        }

        self.progress.on_batch_complete(outcome.written, outcome.failed(), total);
        Ok(outcome)
    }

    fn collect_isolated(&self, entity: &Entity) -> Result<(), EntityError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.collect(entity)))
            .unwrap_or_else(|payload| Err(EntityError::Panicked(panic_message(payload.as_ref()))))
    }

    fn collect(&self, entity: &Entity) -> Result<(), EntityError> {
        let raw = self.fetcher.fetch(&entity.url)?;
        let fields = self.extractor.extract(&raw)?;
        let snapshot = FinancialSnapshot::now(fields);
        let entity_id = self.store.resolve_or_create_entity_id(entity)?;
        self.store.append_snapshot(entity_id, &snapshot)?;
        Ok(())
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundlab_core::{EntityId, FieldMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StaticFetcher;

    impl PageFetcher for StaticFetcher {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch(&self, address: &str) -> Result<String, FetchError> {
            if address.contains("down") {
                return Err(FetchError::Unreachable {
                    address: address.into(),
                    reason: "connection refused".into(),
                });
            }
            Ok(address.to_string())
        }
    }

    struct PerFromAddress;

    impl FieldExtractor for PerFromAddress {
        fn extract(&self, raw: &str) -> Result<FieldMap, ExtractionError> {
            if raw.contains("panic") {
                panic!("extractor blew up on {raw}");
            }
            Ok(FieldMap { per: Some(raw.len() as f64), ..Default::default() })
        }
    }

    #[derive(Default)]
    struct MemoryWriter {
        ids: AtomicUsize,
        appended: Mutex<Vec<EntityId>>,
    }

    impl SnapshotWriter for MemoryWriter {
        fn resolve_or_create_entity_id(&self, _entity: &Entity) -> Result<EntityId, StoreError> {
            Ok(EntityId(self.ids.fetch_add(1, Ordering::SeqCst) as i64))
        }

        fn append_snapshot(
            &self,
            entity_id: EntityId,
            _snapshot: &FinancialSnapshot,
        ) -> Result<i64, StoreError> {
            let mut appended = self.appended.lock().unwrap();
            appended.push(entity_id);
            Ok(appended.len() as i64)
        }
    }

    fn entities(addresses: &[&str]) -> Vec<Entity> {
        addresses
            .iter()
            .enumerate()
            .map(|(i, a)| Entity::new(format!("E{i}"), format!("T{i}"), *a))
            .collect()
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let writer = MemoryWriter::default();
        let pool = BoundedWorkerPool::new(&StaticFetcher, &PerFromAddress, &writer);
        let err = pool.run(&entities(&["a"]), 0).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConcurrency(0)));
    }

    #[test]
    fn empty_entity_set_is_a_noop() {
        let writer = MemoryWriter::default();
        let pool = BoundedWorkerPool::new(&StaticFetcher, &PerFromAddress, &writer);
        let outcome = pool.run(&[], 3).unwrap();
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.written, 0);
        assert!(writer.appended.lock().unwrap().is_empty());
    }

    #[test]
    fn failures_are_isolated_and_ordered() {
        let writer = MemoryWriter::default();
        let pool = BoundedWorkerPool::new(&StaticFetcher, &PerFromAddress, &writer);
        let set = entities(&["ok-1", "down-1", "ok-2", "panic-1", "ok-3", "down-2"]);

        let outcome = pool.run(&set, 2).unwrap();

        assert_eq!(outcome.total, 6);
        assert_eq!(outcome.written, 3);
        let failed: Vec<_> = outcome.failures.iter().map(|(e, err)| (e.url.as_str(), err.kind())).collect();
        assert_eq!(
            failed,
            [("down-1", "fetch_unreachable"), ("panic-1", "task_panicked"), ("down-2", "fetch_unreachable")]
        );
        assert_eq!(writer.appended.lock().unwrap().len(), 3);
    }
}
