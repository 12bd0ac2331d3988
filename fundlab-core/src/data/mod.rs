//! Fetch and extraction collaborators.
//!
//! The collection pool only sees these through the [`PageFetcher`] and
//! [`FieldExtractor`] traits so tests can run without network access.

pub mod extract;
pub mod http;
pub mod numeric;
pub mod provider;
pub mod quotes;

pub use extract::{ExtractionError, FieldExtractor, HtmlFinancialsExtractor};
pub use http::HttpFetcher;
pub use numeric::parse_es_number;
pub use provider::{FetchError, PageFetcher};
pub use quotes::extract_quote_board;
