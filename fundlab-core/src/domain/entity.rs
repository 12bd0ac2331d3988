use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identity of an entity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tracked company: display name, ticker, and the page its financials live on.
///
/// Entities are fixed at configuration time. The ticker is the identity key
/// in the store; two entities with the same ticker resolve to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub ticker: String,
    pub url: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), ticker: ticker.into(), url: url.into() }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.ticker)
    }
}
