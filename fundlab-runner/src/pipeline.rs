//! The three run phases: quotes, finances, analysis.
//!
//! Phases communicate only through the artifact tree, so each can be run
//! on its own. Structural failures propagate as `anyhow` errors; a
//! [`DatasetError::MissingPrecondition`] stays downcastable for callers
//! that want to tell it apart.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use fundlab_core::{
    clean_quote_rows, extract_quote_board, FieldExtractor, FinancialSnapshot, PageFetcher,
    SharedStore,
};
use serde::Serialize;

use crate::config::RunConfig;
use crate::dataset::{load_working_dataset, DatasetError};
use crate::export::{
    write_clean_quotes, write_final_table, write_final_table_xlsx, write_finances_clean, write_json,
    write_raw_quotes,
};
use crate::graph::{StageGraph, StageTimeline};
use crate::layout::ArtifactLayout;
use crate::merge::merge;
use crate::pool::{BoundedWorkerPool, PoolOutcome};
use crate::progress::FetchProgress;

/// Collaborators a full run needs.
pub struct Collaborators<'a> {
    /// Fetches the quote board page.
    pub quote_fetcher: &'a dyn PageFetcher,
    /// Fetches entity pages.
    pub page_fetcher: &'a dyn PageFetcher,
    pub extractor: &'a dyn FieldExtractor,
    pub progress: &'a dyn FetchProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotesReport {
    pub rows: usize,
    pub raw_path: PathBuf,
    pub clean_path: PathBuf,
}

#[derive(Debug)]
pub struct FinancesReport {
    pub outcome: PoolOutcome,
    /// Entities in the store after the run, including earlier runs.
    pub entities_in_store: usize,
    pub finances_path: PathBuf,
}

/// Artifact locations recorded in the manifest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestArtifacts {
    pub final_table: PathBuf,
    pub final_table_xlsx: PathBuf,
    pub raw_merge: PathBuf,
    pub finances: PathBuf,
    pub quotes: PathBuf,
}

/// Summary of one analysis run, written next to the final table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunManifest {
    pub run_date: String,
    pub generated_at: String,
    pub row_count: usize,
    /// BLAKE3 over the working dataset.
    pub dataset_hash: String,
    pub stage_durations_ms: BTreeMap<String, f64>,
    pub recommendations: BTreeMap<String, usize>,
    pub artifacts: ManifestArtifacts,
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub manifest: RunManifest,
    pub manifest_path: PathBuf,
}

impl AnalysisReport {
    pub fn final_table_path(&self) -> &PathBuf {
        &self.manifest.artifacts.final_table
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// `None` when the quotes phase failed; the failure was logged.
    pub quotes: Option<QuotesReport>,
    pub finances: FinancesReport,
    pub analysis: AnalysisReport,
}

// ─── Quotes ─────────────────────────────────────────────────────────

/// Fetch the quote board and write its raw and cleaned tables.
pub fn collect_quotes(
    config: &RunConfig,
    layout: &ArtifactLayout,
    fetcher: &dyn PageFetcher,
) -> Result<QuotesReport> {
    tracing::info!(url = %config.quotes.url, "fetching quote board");
    let html = fetcher.fetch(&config.quotes.url)?;
    let captured_at = chrono::Local::now().format(FinancialSnapshot::TIMESTAMP_FORMAT).to_string();
    let raw = extract_quote_board(&html, &config.quotes.link_base, &captured_at)?;

    let raw_path = layout.quotes_raw();
    let clean_path = layout.quotes_clean();
    write_raw_quotes(&raw_path, &raw)?;
    write_clean_quotes(&clean_path, &clean_quote_rows(&raw))?;

    tracing::info!(rows = raw.len(), path = %clean_path.display(), "quote board saved");
    Ok(QuotesReport { rows: raw.len(), raw_path, clean_path })
}

// ─── Finances ───────────────────────────────────────────────────────

/// Register the configured entities, collect them under the concurrency
/// cap, and export the latest snapshot per entity.
pub fn collect_finances(
    config: &RunConfig,
    layout: &ArtifactLayout,
    fetcher: &dyn PageFetcher,
    extractor: &dyn FieldExtractor,
    progress: &dyn FetchProgress,
) -> Result<FinancesReport> {
    let store = SharedStore::open(layout.db_path())
        .with_context(|| format!("cannot open store at {}", layout.db_path().display()))?;
    store.register_entities(&config.entities)?;

    let outcome = BoundedWorkerPool::new(fetcher, extractor, &store)
        .with_progress(progress)
        .run(&config.entities, config.concurrency)?;

    tracing::info!(
        total = outcome.total,
        written = outcome.written,
        failed = outcome.failed(),
        concurrency = config.concurrency,
        "finances phase complete"
    );
    for (entity, err) in &outcome.failures {
        tracing::warn!(ticker = %entity.ticker, kind = err.kind(), "skipped {}", entity.name);
    }

    let joined = store.query_joined_snapshots()?;
    let finances_path = layout.finances_clean();
    write_finances_clean(&finances_path, &joined)?;

    Ok(FinancesReport { outcome, entities_in_store: joined.len(), finances_path })
}

// ─── Analysis ───────────────────────────────────────────────────────

/// Load the working dataset, run the stage graph, merge, and write the
/// final table plus its manifest.
pub fn run_analysis(layout: &ArtifactLayout) -> Result<AnalysisReport> {
    let finances_path = layout.finances_clean();
    let quotes_path = layout.quotes_clean();
    let dataset = load_working_dataset(&finances_path, &quotes_path)?;
    let dataset_hash = dataset.dataset_hash();
    tracing::info!(rows = dataset.len(), hash = %dataset_hash, "working dataset loaded");

    let timeline = StageTimeline::new();
    let raw_merge_path = layout.dataset_joined();
    let results = StageGraph::new(&raw_merge_path).with_observer(&timeline).run(&dataset)?;
    let table = merge(dataset, results)?;

    let final_path = layout.analysis_csv();
    write_final_table(&final_path, &table)?;
    let xlsx_path = layout.analysis_xlsx();
    write_final_table_xlsx(&xlsx_path, &table)?;

    let manifest = RunManifest {
        run_date: layout.run_date().to_string(),
        generated_at: chrono::Local::now().to_rfc3339(),
        row_count: table.len(),
        dataset_hash,
        stage_durations_ms: timeline
            .durations()
            .into_iter()
            .map(|(stage, d)| (stage.name().to_string(), d.as_secs_f64() * 1000.0))
            .collect(),
        recommendations: table
            .recommendation_counts()
            .into_iter()
            .map(|(r, n)| (r.as_str().to_string(), n))
            .collect(),
        artifacts: ManifestArtifacts {
            final_table: final_path,
            final_table_xlsx: xlsx_path,
            raw_merge: raw_merge_path,
            finances: finances_path,
            quotes: quotes_path,
        },
    };
    let manifest_path = layout.manifest();
    write_json(&manifest_path, &manifest)?;

    tracing::info!(
        rows = manifest.row_count,
        path = %manifest.artifacts.final_table.display(),
        "analysis complete"
    );
    Ok(AnalysisReport { manifest, manifest_path })
}

// ─── Full run ───────────────────────────────────────────────────────

/// Quotes, then finances, then analysis. A quotes failure is logged and
/// does not stop the later phases.
pub fn run_all(
    config: &RunConfig,
    layout: &ArtifactLayout,
    collaborators: &Collaborators<'_>,
) -> Result<RunReport> {
    let quotes = match collect_quotes(config, layout, collaborators.quote_fetcher) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!("quotes phase failed: {e:#}");
            None
        }
    };

    let finances = collect_finances(
        config,
        layout,
        collaborators.page_fetcher,
        collaborators.extractor,
        collaborators.progress,
    )?;

    let analysis = run_analysis(layout)?;
    Ok(RunReport { quotes, finances, analysis })
}

/// True when `err` means an analysis input was missing.
pub fn is_missing_precondition(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<DatasetError>(), Some(DatasetError::MissingPrecondition { .. }))
}
