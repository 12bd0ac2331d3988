//! Financial attributes extracted for one entity.

use serde::{Deserialize, Serialize};

/// Labeled numeric fields extracted from an entity page.
///
/// Every field is always present as a key; `None` means the page did not
/// carry a usable value, which is distinct from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    pub per: Option<f64>,
    pub bpa: Option<f64>,
    pub ebitda: Option<f64>,
    pub beneficio: Option<f64>,
    pub deuda: Option<f64>,
}

impl FieldMap {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.per.is_none()
            && self.bpa.is_none()
            && self.ebitda.is_none()
            && self.beneficio.is_none()
            && self.deuda.is_none()
    }
}

/// One timestamped set of financial attributes for one entity.
///
/// Created by a collection task and never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Local wall-clock time of collection, `%Y-%m-%d %H:%M:%S`.
    pub recorded_at: String,
    pub fields: FieldMap,
}

impl FinancialSnapshot {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Stamp `fields` with the current local time.
    pub fn now(fields: FieldMap) -> Self {
        Self {
            recorded_at: chrono::Local::now().format(Self::TIMESTAMP_FORMAT).to_string(),
            fields,
        }
    }
}
