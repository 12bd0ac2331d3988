//! Quote board extraction.
//!
//! The board is a single page listing every constituent with its last
//! price, daily change, and session range. Only the table captioned
//! "Principales valores" is read.

use scraper::Html;

use super::extract::{selector, stripped_text, ExtractionError};
use crate::domain::RawQuoteRow;

const BOARD_MARKER: &str = "Principales valores";

/// Pull raw quote rows out of the board page.
///
/// `link_base` is prefixed to each row's relative href; `captured_at` is
/// stamped on every row.
pub fn extract_quote_board(
    html: &str,
    link_base: &str,
    captured_at: &str,
) -> Result<Vec<RawQuoteRow>, ExtractionError> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tbody tr")?;
    let th_sel = selector("th")?;
    let link_sel = selector("a")?;
    let td_sel = selector("td")?;

    let table = doc
        .select(&table_sel)
        .find(|t| {
            let text: Vec<&str> = t.text().map(str::trim).filter(|s| !s.is_empty()).collect();
            text.join(" ").contains(BOARD_MARKER)
        })
        .ok_or_else(|| ExtractionError::TableNotFound(BOARD_MARKER.to_string()))?;

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let Some(th) = tr.select(&th_sel).next() else {
            continue;
        };
        let Some(anchor) = th.select(&link_sel).next() else {
            continue;
        };
        let tds: Vec<String> = tr.select(&td_sel).map(stripped_text).collect();
        if tds.len() < 5 {
            continue;
        }

        let href = anchor.value().attr("href").unwrap_or("").trim();
        rows.push(RawQuoteRow {
            link: format!("{link_base}{href}"),
            name: stripped_text(anchor),
            value: tds[0].clone(),
            var: tds[1].clone(),
            datetime: captured_at.to_string(),
            max: tds[3].clone(),
            min: tds[4].clone(),
        });
    }

    Ok(rows)
}
