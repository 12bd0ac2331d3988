//! Domain types for fundlab

pub mod entity;
pub mod quote;
pub mod signal;
pub mod snapshot;

pub use entity::{Entity, EntityId};
pub use quote::{clean_quote_rows, QuoteRow, RawQuoteRow};
pub use signal::{BpaSignal, PerSignal, Recommendation};
pub use snapshot::{FieldMap, FinancialSnapshot};
