//! Persist the working dataset as-is.

use std::path::Path;

use super::RawMergeArtifact;
use crate::dataset::WorkingDataset;
use crate::export::{write_working_dataset, ExportError};

pub fn persist_raw_merge(dataset: &WorkingDataset, path: &Path) -> Result<RawMergeArtifact, ExportError> {
    write_working_dataset(path, dataset)?;
    Ok(RawMergeArtifact { path: path.to_path_buf(), rows: dataset.len() })
}
