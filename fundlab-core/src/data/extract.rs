//! Labeled field extraction from entity pages.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::numeric::parse_es_number;
use crate::domain::FieldMap;

/// Errors raised while pulling fields out of markup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("document contains no tables")]
    NoTables,

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid selector {0}")]
    Selector(String),
}

impl ExtractionError {
    pub fn kind(&self) -> &'static str {
        "extraction"
    }
}

/// Turns the raw content of an entity page into a [`FieldMap`].
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, raw: &str) -> Result<FieldMap, ExtractionError>;
}

/// Reads (label, value) pairs from the first two cells of every table row.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFinancialsExtractor;

impl FieldExtractor for HtmlFinancialsExtractor {
    fn extract(&self, raw: &str) -> Result<FieldMap, ExtractionError> {
        let doc = Html::parse_document(raw);
        let table_sel = selector("table")?;
        let row_sel = selector("tr")?;
        let cell_sel = selector("td, th")?;

        let mut fields = FieldMap::default();
        let mut saw_table = false;

        for table in doc.select(&table_sel) {
            saw_table = true;
            for row in table.select(&row_sel) {
                let mut cells = row.select(&cell_sel);
                let (Some(label), Some(value)) = (cells.next(), cells.next()) else {
                    continue;
                };
                let label = stripped_text(label).to_lowercase();
                let value = parse_es_number(&stripped_text(value));
                assign_field(&mut fields, &label, value);
            }
        }

        if !saw_table {
            return Err(ExtractionError::NoTables);
        }
        Ok(fields)
    }
}

/// Route a value to its field by label. Precedence matters: "per" wins over
/// any later keyword contained in the same label.
fn assign_field(fields: &mut FieldMap, label: &str, value: Option<f64>) {
    if label.contains("per") {
        fields.per = value;
    } else if label.contains("bpa") {
        fields.bpa = value;
    } else if label.contains("ebitda") {
        fields.ebitda = value;
    } else if label.contains("benef") {
        fields.beneficio = value;
    } else if label.contains("deuda") {
        fields.deuda = value;
    }
}

pub(crate) fn selector(css: &'static str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("{css}: {e:?}")))
}

/// Concatenated text of an element with each text node trimmed.
pub(crate) fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table>
            <tr><th>PER</th><td>11,4</td></tr>
            <tr><td>BPA</td><td>1,32</td></tr>
            <tr><td>EBITDA</td><td>12.345,0</td></tr>
          </table>
          <table>
            <tr><td>Beneficio neto</td><td>4.567</td></tr>
            <tr><td>Deuda neta</td><td>--</td></tr>
            <tr><td>sin valor</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn extracts_labeled_fields() {
        let fields = HtmlFinancialsExtractor.extract(PAGE).unwrap();
        assert_eq!(fields.per, Some(11.4));
        assert_eq!(fields.bpa, Some(1.32));
        assert_eq!(fields.ebitda, Some(12345.0));
        assert_eq!(fields.beneficio, Some(4567.0));
        assert_eq!(fields.deuda, None);
    }

    #[test]
    fn missing_labels_stay_absent() {
        let page = "<table><tr><td>BPA</td><td>0,2</td></tr></table>";
        let fields = HtmlFinancialsExtractor.extract(page).unwrap();
        assert_eq!(fields.bpa, Some(0.2));
        assert_eq!(fields.per, None);
        assert_eq!(fields.ebitda, None);
    }

    #[test]
    fn later_rows_overwrite_earlier() {
        let page = "<table><tr><td>PER</td><td>10</td></tr><tr><td>PER 2025e</td><td>9,5</td></tr></table>";
        let fields = HtmlFinancialsExtractor.extract(page).unwrap();
        assert_eq!(fields.per, Some(9.5));
    }

    #[test]
    fn no_tables_is_an_error() {
        let err = HtmlFinancialsExtractor.extract("<html><p>maintenance</p></html>").unwrap_err();
        assert_eq!(err, ExtractionError::NoTables);
    }
}
