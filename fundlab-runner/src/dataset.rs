//! The working dataset driving the analysis stages.
//!
//! Built once from the cleaned finances and quote tables, then shared
//! read-only with every stage thread. Row order is the finances table's
//! order (entity id order) and never changes after construction.

use std::path::{Path, PathBuf};

use fundlab_core::FieldMap;
use serde::Deserialize;
use thiserror::Error;

/// Errors from locating or loading the analysis inputs.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("required input {path} does not exist; run the collection phases first")]
    MissingPrecondition { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// One row of the cleaned finances table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinanceRecord {
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub per: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub bpa: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub ebitda: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub beneficio: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub deuda: Option<f64>,
}

impl FinanceRecord {
    pub fn fields(&self) -> FieldMap {
        FieldMap {
            per: self.per,
            bpa: self.bpa,
            ebitda: self.ebitda,
            beneficio: self.beneficio,
            deuda: self.deuda,
        }
    }
}

/// The quote columns the analysis needs. Non-numeric cells load as absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteRecord {
    pub name: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub value: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub var: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub max: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub min: Option<f64>,
}

/// One entity's snapshot fields joined with its quote.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingRow {
    pub name: String,
    pub ticker: String,
    pub recorded_at: Option<String>,
    pub fields: FieldMap,
    pub value: Option<f64>,
    pub var: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Row-aligned, read-only table. One row per entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingDataset {
    rows: Vec<WorkingRow>,
}

impl WorkingDataset {
    pub fn new(rows: Vec<WorkingRow>) -> Self {
        Self { rows }
    }

    /// Left-join finances with quotes on entity name.
    ///
    /// Every finance row survives; when several quotes carry the same name
    /// the first one wins.
    pub fn join(finances: &[FinanceRecord], quotes: &[QuoteRecord]) -> Self {
        let rows = finances
            .iter()
            .map(|f| {
                let quote = quotes.iter().find(|q| q.name.trim() == f.name.trim());
                WorkingRow {
                    name: f.name.clone(),
                    ticker: f.ticker.clone(),
                    recorded_at: f.recorded_at.clone().filter(|s| !s.is_empty()),
                    fields: f.fields(),
                    value: quote.and_then(|q| q.value),
                    var: quote.and_then(|q| q.var),
                    max: quote.and_then(|q| q.max),
                    min: quote.and_then(|q| q.min),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[WorkingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// BLAKE3 hash over every cell, in row order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for row in &self.rows {
            hasher.update(row.name.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(row.ticker.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(row.recorded_at.as_deref().unwrap_or("").as_bytes());
            let f = &row.fields;
            for cell in [f.per, f.bpa, f.ebitda, f.beneficio, f.deuda, row.value, row.var, row.max, row.min] {
                match cell {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
            hasher.update(b"\x1e");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Check both inputs exist, then load and join them.
///
/// Fails with [`DatasetError::MissingPrecondition`] before reading
/// anything if either file is absent.
pub fn load_working_dataset(
    finances_path: &Path,
    quotes_path: &Path,
) -> Result<WorkingDataset, DatasetError> {
    for path in [finances_path, quotes_path] {
        if !path.exists() {
            return Err(DatasetError::MissingPrecondition { path: path.to_path_buf() });
        }
    }
    let finances: Vec<FinanceRecord> = read_records(finances_path)?;
    let quotes: Vec<QuoteRecord> = read_records(quotes_path)?;
    Ok(WorkingDataset::join(&finances, &quotes))
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let csv_err = |source| DatasetError::Csv { path: path.to_path_buf(), source };
    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let records = rdr.deserialize().collect::<Result<Vec<T>, _>>().map_err(csv_err)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn finance(name: &str, per: Option<f64>) -> FinanceRecord {
        FinanceRecord {
            name: name.into(),
            ticker: name.to_uppercase(),
            recorded_at: Some("2024-05-02 10:00:00".into()),
            per,
            bpa: None,
            ebitda: None,
            beneficio: None,
            deuda: None,
        }
    }

    fn quote(name: &str, value: f64) -> QuoteRecord {
        QuoteRecord { name: name.into(), value: Some(value), var: None, max: None, min: None }
    }

    #[test]
    fn left_join_keeps_every_finance_row_in_order() {
        let finances = [finance("Repsol", Some(8.0)), finance("AENA", None), finance("Endesa", Some(14.0))];
        let quotes = [quote("Endesa", 19.5), quote("Repsol", 13.2), quote("Repsol", 99.0)];

        let ds = WorkingDataset::join(&finances, &quotes);

        let names: Vec<_> = ds.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Repsol", "AENA", "Endesa"]);
        assert_eq!(ds.rows()[0].value, Some(13.2));
        assert_eq!(ds.rows()[1].value, None);
        assert_eq!(ds.rows()[2].value, Some(19.5));
    }

    #[test]
    fn hash_changes_with_content() {
        let a = WorkingDataset::join(&[finance("Repsol", Some(8.0))], &[]);
        let b = WorkingDataset::join(&[finance("Repsol", Some(8.5))], &[]);
        assert_eq!(a.dataset_hash(), a.clone().dataset_hash());
        assert_ne!(a.dataset_hash(), b.dataset_hash());
    }

    #[test]
    fn missing_input_is_a_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let finances = dir.path().join("finances_clean.csv");
        std::fs::write(&finances, "name,ticker,recorded_at,per,bpa,ebitda,beneficio,deuda\n").unwrap();

        let err = load_working_dataset(&finances, &dir.path().join("quotes_clean.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::MissingPrecondition { .. }));
    }

    #[test]
    fn non_numeric_quote_cells_load_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let finances = dir.path().join("finances_clean.csv");
        let quotes = dir.path().join("quotes_clean.csv");
        std::fs::write(
            &finances,
            "entity_id,name,ticker,recorded_at,per,bpa,ebitda,beneficio,deuda\n\
             1,BBVA,BBVA,2024-05-02 10:00:00,6.5,1.7,,8000,\n\
             2,AENA,AENA,,,,,,\n",
        )
        .unwrap();
        let mut f = std::fs::File::create(&quotes).unwrap();
        writeln!(f, "link,name,value,var,datetime,max,min").unwrap();
        writeln!(f, "https://x.test/bbva,BBVA,9.81,n/a,2024-05-02 10:00:00,,9.7").unwrap();

        let ds = load_working_dataset(&finances, &quotes).unwrap();

        assert_eq!(ds.len(), 2);
        let bbva = &ds.rows()[0];
        assert_eq!(bbva.fields.per, Some(6.5));
        assert_eq!(bbva.fields.ebitda, None);
        assert_eq!(bbva.value, Some(9.81));
        assert_eq!(bbva.var, None);
        assert_eq!(bbva.min, Some(9.7));
        assert!(ds.rows()[1].fields.is_empty());
        assert_eq!(ds.rows()[1].recorded_at, None);
    }
}
