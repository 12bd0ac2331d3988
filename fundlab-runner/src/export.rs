//! CSV, spreadsheet, and JSON artifact writers.
//!
//! CSV numbers are written in their shortest round-trip form, spreadsheet
//! numbers as numeric cells; absent values are empty cells either way.
//! Parent directories are created as needed.

use std::fs::File;
use std::path::{Path, PathBuf};

use fundlab_core::{JoinedSnapshotRow, QuoteRow, RawQuoteRow};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;

use crate::dataset::{WorkingDataset, WorkingRow};
use crate::merge::FinalTable;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot write spreadsheet {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    #[error("cannot serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

const WORKING_HEADER: [&str; 12] = [
    "name",
    "ticker",
    "per",
    "bpa",
    "ebitda",
    "beneficio",
    "deuda",
    "recorded_at",
    "value",
    "var",
    "max",
    "min",
];

const DERIVED_HEADER: [&str; 5] =
    ["deuda_ebitda", "ebitda_beneficio", "per_signal", "bpa_signal", "recommendation"];

// ─── Quote tables ───────────────────────────────────────────────────

/// Raw board rows exactly as scraped.
pub fn write_raw_quotes(path: &Path, rows: &[RawQuoteRow]) -> Result<(), ExportError> {
    serialize_rows(path, rows)
}

/// Cleaned board rows.
pub fn write_clean_quotes(path: &Path, rows: &[QuoteRow]) -> Result<(), ExportError> {
    let mut wtr = create_writer(path)?;
    let csv_err = |source| ExportError::Csv { path: path.to_path_buf(), source };

    wtr.write_record(["link", "name", "value", "var", "datetime", "max", "min"]).map_err(csv_err)?;
    for r in rows {
        wtr.write_record([
            r.link.clone(),
            r.name.clone(),
            fmt_opt(r.value),
            fmt_opt(r.var),
            r.datetime.clone(),
            fmt_opt(r.max),
            fmt_opt(r.min),
        ])
        .map_err(csv_err)?;
    }
    finish(path, wtr)
}

// ─── Finances ───────────────────────────────────────────────────────

/// Latest snapshot per entity, in entity id order.
pub fn write_finances_clean(path: &Path, rows: &[JoinedSnapshotRow]) -> Result<(), ExportError> {
    let mut wtr = create_writer(path)?;
    let csv_err = |source| ExportError::Csv { path: path.to_path_buf(), source };

    wtr.write_record([
        "entity_id",
        "name",
        "ticker",
        "recorded_at",
        "per",
        "bpa",
        "ebitda",
        "beneficio",
        "deuda",
    ])
    .map_err(csv_err)?;

    for r in rows {
        let f = &r.fields;
        wtr.write_record([
            r.entity_id.to_string(),
            r.name.clone(),
            r.ticker.clone(),
            r.recorded_at.clone().unwrap_or_default(),
            fmt_opt(f.per),
            fmt_opt(f.bpa),
            fmt_opt(f.ebitda),
            fmt_opt(f.beneficio),
            fmt_opt(f.deuda),
        ])
        .map_err(csv_err)?;
    }
    finish(path, wtr)
}

// ─── Analysis tables ────────────────────────────────────────────────

/// The working dataset, one row per entity.
pub fn write_working_dataset(path: &Path, dataset: &WorkingDataset) -> Result<(), ExportError> {
    let mut wtr = create_writer(path)?;
    let csv_err = |source| ExportError::Csv { path: path.to_path_buf(), source };

    wtr.write_record(WORKING_HEADER).map_err(csv_err)?;
    for row in dataset.rows() {
        wtr.write_record(working_cells(row)).map_err(csv_err)?;
    }
    finish(path, wtr)
}

/// Working columns followed by ratios, signals and the recommendation.
pub fn write_final_table(path: &Path, table: &FinalTable) -> Result<(), ExportError> {
    let mut wtr = create_writer(path)?;
    let csv_err = |source| ExportError::Csv { path: path.to_path_buf(), source };

    wtr.write_record(WORKING_HEADER.iter().chain(DERIVED_HEADER.iter())).map_err(csv_err)?;
    for row in table.rows() {
        let mut cells = working_cells(&row.base);
        cells.extend([
            fmt_opt(row.deuda_ebitda),
            fmt_opt(row.ebitda_beneficio),
            row.per_signal.to_string(),
            row.bpa_signal.to_string(),
            row.recommendation.to_string(),
        ]);
        wtr.write_record(&cells).map_err(csv_err)?;
    }
    finish(path, wtr)
}

// ─── Spreadsheet ────────────────────────────────────────────────────

const SHEET_NAME: &str = "analysis";

/// The final table as a one-sheet workbook, same columns as the CSV.
pub fn write_final_table_xlsx(path: &Path, table: &FinalTable) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let xlsx_err = |source| ExportError::Xlsx { path: path.to_path_buf(), source };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

    for (col, title) in WORKING_HEADER.iter().chain(DERIVED_HEADER.iter()).enumerate() {
        sheet.write_string(0, col as u16, *title).map_err(xlsx_err)?;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let r = i as u32 + 1;
        let base = &row.base;
        let f = &base.fields;
        let cells = [
            Cell::Text(&base.name),
            Cell::Text(&base.ticker),
            Cell::Number(f.per),
            Cell::Number(f.bpa),
            Cell::Number(f.ebitda),
            Cell::Number(f.beneficio),
            Cell::Number(f.deuda),
            Cell::Text(base.recorded_at.as_deref().unwrap_or("")),
            Cell::Number(base.value),
            Cell::Number(base.var),
            Cell::Number(base.max),
            Cell::Number(base.min),
            Cell::Number(row.deuda_ebitda),
            Cell::Number(row.ebitda_beneficio),
            Cell::Text(row.per_signal.as_str()),
            Cell::Text(row.bpa_signal.as_str()),
            Cell::Text(row.recommendation.as_str()),
        ];
        for (col, cell) in cells.into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) if !text.is_empty() => {
                    sheet.write_string(r, col, text).map_err(xlsx_err)?;
                }
                Cell::Number(Some(v)) => {
                    sheet.write_number(r, col, v).map_err(xlsx_err)?;
                }
                _ => {}
            }
        }
    }

    workbook.save(path).map_err(xlsx_err)
}

enum Cell<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Pretty-printed JSON document.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)?;
    ensure_parent(path)?;
    std::fs::write(path, json).map_err(|source| ExportError::Io { path: path.to_path_buf(), source })
}

// ─── Helpers ────────────────────────────────────────────────────────

fn working_cells(row: &WorkingRow) -> Vec<String> {
    let f = &row.fields;
    vec![
        row.name.clone(),
        row.ticker.clone(),
        fmt_opt(f.per),
        fmt_opt(f.bpa),
        fmt_opt(f.ebitda),
        fmt_opt(f.beneficio),
        fmt_opt(f.deuda),
        row.recorded_at.clone().unwrap_or_default(),
        fmt_opt(row.value),
        fmt_opt(row.var),
        fmt_opt(row.max),
        fmt_opt(row.min),
    ]
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn serialize_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = create_writer(path)?;
    for row in rows {
        wtr.serialize(row).map_err(|source| ExportError::Csv { path: path.to_path_buf(), source })?;
    }
    finish(path, wtr)
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent)
            .map_err(|source| ExportError::Io { path: parent.to_path_buf(), source }),
        None => Ok(()),
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, ExportError> {
    ensure_parent(path)?;
    csv::Writer::from_path(path).map_err(|source| ExportError::Csv { path: path.to_path_buf(), source })
}

fn finish(path: &Path, mut wtr: csv::Writer<File>) -> Result<(), ExportError> {
    wtr.flush().map_err(|source| ExportError::Io { path: path.to_path_buf(), source })
}
