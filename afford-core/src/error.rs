//! Error types shared by the calculators.
//!
//! Two families of failure exist: the caller handed us something that cannot
//! be computed ([`InvalidInput`]), or the reference data does not cover the
//! request ([`ConfigurationGap`]). Near-zero interest rates are recovered
//! locally by the amortization code and never reach this module.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::FilingStatus;

/// Inputs that no calculator accepts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("gross income must be non-negative, got {0}")]
    NegativeIncome(Decimal),

    #[error("unrecognised filing status '{0}'")]
    UnknownFilingStatus(String),

    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },

    #[error("annual interest rate must be positive, got {0}")]
    NonPositiveRate(Decimal),

    #[error("loan term must be at least one year")]
    NonPositiveTerm,

    #[error("{0} is too large to compute")]
    AmountTooLarge(&'static str),
}

/// The reference data has no answer for the requested combination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationGap {
    #[error("state '{0}' is not present in the reference data")]
    UnknownState(String),

    #[error("state '{state}' has no progressive brackets for filing status {filing_status}")]
    MissingBrackets {
        state: String,
        filing_status: FilingStatus,
    },
}

/// Any failure a calculation entry point can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error(transparent)]
    ConfigurationGap(#[from] ConfigurationGap),
}
