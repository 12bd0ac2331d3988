//! Qualitative labels derived from the numeric fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Valuation band of the price/earnings ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerSignal {
    Cheap,
    Mid,
    Expensive,
    Unknown,
}

/// Strength band of earnings per share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BpaSignal {
    Weak,
    Mid,
    High,
    Unknown,
}

/// Final per-entity action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl PerSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cheap => "Cheap",
            Self::Mid => "Mid",
            Self::Expensive => "Expensive",
            Self::Unknown => "Unknown",
        }
    }
}

impl BpaSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Mid => "Mid",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
        }
    }
}

impl fmt::Display for PerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BpaSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
