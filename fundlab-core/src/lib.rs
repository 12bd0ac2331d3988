//! fundlab core: domain types, collaborators, and the shared snapshot store.
//!
//! This crate holds everything the collection and analysis layers consume:
//! - Domain types (entities, field maps, snapshots, quote rows, signal labels)
//! - Page fetching behind the `PageFetcher` trait, with a blocking HTTP impl
//! - Field and quote-board extraction from markup
//! - Spanish-locale number normalization
//! - `SharedStore`: SQLite persistence with serialized writes

pub mod data;
pub mod domain;
pub mod store;

pub use data::{
    extract_quote_board, parse_es_number, ExtractionError, FetchError, FieldExtractor,
    HtmlFinancialsExtractor, HttpFetcher, PageFetcher,
};
pub use domain::{
    clean_quote_rows, BpaSignal, Entity, EntityId, FieldMap, FinancialSnapshot, PerSignal, QuoteRow, RawQuoteRow,
    Recommendation,
};
pub use store::{JoinedSnapshotRow, SharedStore, SnapshotWriter, StoreError};
