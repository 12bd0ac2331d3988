//! Quote board rows, as scraped and after numeric cleaning.

use serde::{Deserialize, Serialize};

use crate::data::numeric::parse_es_number;

/// A quote board row exactly as it appeared on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuoteRow {
    pub link: String,
    pub name: String,
    pub value: String,
    pub var: String,
    pub datetime: String,
    pub max: String,
    pub min: String,
}

/// A quote board row with its numeric cells normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub link: String,
    pub name: String,
    pub value: Option<f64>,
    pub var: Option<f64>,
    pub datetime: String,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl From<&RawQuoteRow> for QuoteRow {
    fn from(raw: &RawQuoteRow) -> Self {
        Self {
            link: raw.link.clone(),
            name: raw.name.clone(),
            value: parse_es_number(&raw.value),
            var: parse_es_number(&raw.var),
            datetime: raw.datetime.clone(),
            max: parse_es_number(&raw.max),
            min: parse_es_number(&raw.min),
        }
    }
}

/// Normalize the numeric cells of every raw row.
pub fn clean_quote_rows(raw: &[RawQuoteRow]) -> Vec<QuoteRow> {
    raw.iter().map(QuoteRow::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_spanish_locale_cells() {
        let raw = RawQuoteRow {
            link: "https://example.test/bbva".into(),
            name: "BBVA".into(),
            value: "1.234,50".into(),
            var: "-0,85%".into(),
            datetime: "2024-05-02 10:00:00".into(),
            max: "--".into(),
            min: "".into(),
        };
        let rows = clean_quote_rows(&[raw]);
        assert_eq!(rows[0].value, Some(1234.5));
        assert_eq!(rows[0].var, Some(-0.85));
        assert_eq!(rows[0].max, None);
        assert_eq!(rows[0].min, None);
        assert_eq!(rows[0].name, "BBVA");
    }
}
