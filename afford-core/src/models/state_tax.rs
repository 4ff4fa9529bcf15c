use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FilingStatus, TaxBracketTable};

/// How a state taxes income. Exactly one variant applies per state code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTaxSpec {
    NoTax,
    /// Applied to gross income; no deduction is taken at state level.
    FlatRate(Decimal),
    /// Brackets per filing status. A status may be absent from the map,
    /// which is reported as a configuration gap when that status is used.
    Progressive(BTreeMap<FilingStatus, TaxBracketTable>),
}

impl StateTaxSpec {
    pub fn mode(&self) -> StateTaxMode {
        match self {
            Self::NoTax => StateTaxMode::NoTax,
            Self::FlatRate(_) => StateTaxMode::Flat,
            Self::Progressive(_) => StateTaxMode::Progressive,
        }
    }
}

/// The state side of a tax request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSelection {
    /// A state code resolved against the reference data.
    Code(String),
    /// A flat rate entered by hand when no state is chosen.
    ManualRate(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTaxMode {
    NoTax,
    Flat,
    FlatManual,
    Progressive,
}

impl StateTaxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoTax => "no_tax",
            Self::Flat => "flat",
            Self::FlatManual => "flat_manual",
            Self::Progressive => "progressive",
        }
    }
}

/// How the state figure in a [`TaxResult`](crate::calculations::TaxResult) was
/// produced. `rate` is `None` for progressive states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxDetails {
    pub mode: StateTaxMode,
    pub rate: Option<Decimal>,
    pub tax: Decimal,
}
