//! On-disk artifact layout for a run.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Names every file a run reads or writes, relative to one root.
///
/// Dated artifacts embed the run date as `YYYYMMDD`, so a run's outputs are
/// named deterministically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    run_date: NaiveDate,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>, run_date: NaiveDate) -> Self {
        Self { root: root.into(), run_date }
    }

    /// Layout dated with today's local date.
    pub fn for_today(root: impl Into<PathBuf>) -> Self {
        Self::new(root, chrono::Local::now().date_naive())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn date_tag(&self) -> String {
        self.run_date.format("%Y%m%d").to_string()
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("raw/finances/finances.db")
    }

    pub fn quotes_raw(&self) -> PathBuf {
        self.root.join(format!("raw/quotes/quotes_{}.csv", self.date_tag()))
    }

    pub fn quotes_clean(&self) -> PathBuf {
        self.root.join("processed/quotes_clean.csv")
    }

    pub fn finances_clean(&self) -> PathBuf {
        self.root.join("processed/finances_clean.csv")
    }

    pub fn dataset_joined(&self) -> PathBuf {
        self.root.join("processed/dataset_joined.csv")
    }

    pub fn analysis_csv(&self) -> PathBuf {
        self.root.join(format!("analysis/analysis_results_{}.csv", self.date_tag()))
    }

    pub fn analysis_xlsx(&self) -> PathBuf {
        self.root.join(format!("analysis/analysis_results_{}.xlsx", self.date_tag()))
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(format!("analysis/analysis_manifest_{}.json", self.date_tag()))
    }
}
