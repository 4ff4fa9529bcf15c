//! Federal and state income tax, and the take-home pay left after both.
//!
//! # Method
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Taxable income = gross income − standard deduction (minimum 0) |
//! | 2    | Federal tax = marginal walk of the federal table over taxable income |
//! | 3    | State tax, by state mode (see below) |
//! | 4    | Net annual = gross − federal − state |
//! | 5    | Monthly take-home = net annual ÷ 12 |
//!
//! | State mode | State tax |
//! |------------|-----------|
//! | No tax | 0 |
//! | Flat rate | gross × rate (no deduction) |
//! | Manual flat rate | gross × rate (no deduction) |
//! | Progressive | marginal walk of the state table over the federal taxable income |
//!
//! Take-home is not clamped. If the taxes exceed the income the result
//! carries a negative take-home and callers decide what that means.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use afford_core::calculations::TaxCalculator;
//! use afford_core::{FilingStatus, ReferenceData, StateSelection};
//!
//! let reference = ReferenceData::builtin();
//! let calculator = TaxCalculator::new(&reference);
//! let result = calculator
//!     .calculate(dec!(90000), FilingStatus::Single, &StateSelection::Code("TX".into()))
//!     .unwrap();
//!
//! assert_eq!(result.taxable_income, dec!(75400));
//! assert_eq!(result.federal_tax, dec!(11641.00));
//! assert_eq!(result.state_tax, dec!(0));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{non_negative, round_half_up};
use crate::error::{CalculationError, ConfigurationGap, InvalidInput};
use crate::models::{
    FilingStatus, ReferenceData, StateSelection, StateTaxDetails, StateTaxMode, StateTaxSpec,
    TaxBracketTable,
};

/// Result of a tax calculation. All amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    /// Gross income less the standard deduction, floored at zero.
    pub taxable_income: Decimal,

    pub federal_tax: Decimal,

    pub state_tax: Decimal,

    /// How the state figure was produced.
    pub state_details: StateTaxDetails,

    /// Gross income less federal and state tax. May be negative.
    pub net_annual: Decimal,

    /// `net_annual / 12`. May be negative.
    pub monthly_takehome: Decimal,
}

/// Computes tax liability against a set of reference tables.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    reference: &'a ReferenceData,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Calculates federal and state tax and the resulting take-home pay.
    ///
    /// # Errors
    ///
    /// - [`InvalidInput::NegativeIncome`] if `gross_income` is negative
    /// - [`InvalidInput::RateOutOfRange`] if a manual state rate is outside [0, 1]
    /// - [`ConfigurationGap::UnknownState`] if the state code is not in the reference data
    /// - [`ConfigurationGap::MissingBrackets`] if a progressive state has no
    ///   table for `filing_status`
    pub fn calculate(
        &self,
        gross_income: Decimal,
        filing_status: FilingStatus,
        state: &StateSelection,
    ) -> Result<TaxResult, CalculationError> {
        if gross_income < Decimal::ZERO {
            return Err(InvalidInput::NegativeIncome(gross_income).into());
        }

        let taxable_income = self.taxable_income(gross_income, filing_status);
        let federal_tax = round_half_up(marginal_tax(
            taxable_income,
            self.reference.federal_table(filing_status),
        ));
        let state_details = self.state_tax(gross_income, taxable_income, filing_status, state)?;
        let state_tax = state_details.tax;

        let net_annual = gross_income - federal_tax - state_tax;
        let monthly_takehome = round_half_up(net_annual / Decimal::from(12));

        debug!(
            %gross_income,
            %filing_status,
            %federal_tax,
            %state_tax,
            state_mode = state_details.mode.as_str(),
            "computed tax"
        );
        if monthly_takehome < Decimal::ZERO {
            warn!(%gross_income, %monthly_takehome, "tax exceeds income; take-home is negative");
        }

        Ok(TaxResult {
            taxable_income,
            federal_tax,
            state_tax,
            state_details,
            net_annual,
            monthly_takehome,
        })
    }

    /// Gross income less the federal standard deduction for the status.
    pub fn taxable_income(
        &self,
        gross_income: Decimal,
        filing_status: FilingStatus,
    ) -> Decimal {
        let deduction = self.reference.standard_deduction(filing_status);
        non_negative(gross_income - deduction)
    }

    fn state_tax(
        &self,
        gross_income: Decimal,
        taxable_income: Decimal,
        filing_status: FilingStatus,
        state: &StateSelection,
    ) -> Result<StateTaxDetails, CalculationError> {
        let code = match state {
            StateSelection::ManualRate(rate) => {
                validate_rate(*rate)?;
                return Ok(StateTaxDetails {
                    mode: StateTaxMode::FlatManual,
                    rate: Some(*rate),
                    tax: round_half_up(gross_income * *rate),
                });
            }
            StateSelection::Code(code) => code,
        };

        let details = match self.reference.state_spec(code)? {
            StateTaxSpec::NoTax => StateTaxDetails {
                mode: StateTaxMode::NoTax,
                rate: Some(Decimal::ZERO),
                tax: Decimal::ZERO,
            },
            StateTaxSpec::FlatRate(rate) => StateTaxDetails {
                mode: StateTaxMode::Flat,
                rate: Some(*rate),
                tax: round_half_up(gross_income * *rate),
            },
            StateTaxSpec::Progressive(tables) => {
                let table = progressive_table(code, tables.get(&filing_status), filing_status)?;
                StateTaxDetails {
                    mode: StateTaxMode::Progressive,
                    rate: None,
                    tax: round_half_up(marginal_tax(taxable_income, table)),
                }
            }
        };
        Ok(details)
    }
}

/// Convenience entry point over [`TaxCalculator`].
pub fn compute_tax(
    reference: &ReferenceData,
    gross_income: Decimal,
    filing_status: FilingStatus,
    state: &StateSelection,
) -> Result<TaxResult, CalculationError> {
    TaxCalculator::new(reference).calculate(gross_income, filing_status, state)
}

pub(crate) fn progressive_table<'t>(
    code: &str,
    table: Option<&'t TaxBracketTable>,
    filing_status: FilingStatus,
) -> Result<&'t TaxBracketTable, ConfigurationGap> {
    table.ok_or_else(|| ConfigurationGap::MissingBrackets {
        state: code.trim().to_ascii_uppercase(),
        filing_status,
    })
}

pub(crate) fn validate_rate(rate: Decimal) -> Result<(), InvalidInput> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(InvalidInput::RateOutOfRange {
            field: "state_rate",
            value: rate,
        });
    }
    Ok(())
}

/// Unrounded tax on `taxable_income` under a marginal table.
///
/// Each bracket taxes the income between its lower bound and the next
/// bracket's lower bound. The walk stops at the bracket containing the last
/// dollar of taxable income.
pub fn marginal_tax(
    taxable_income: Decimal,
    table: &TaxBracketTable,
) -> Decimal {
    let taxable = non_negative(taxable_income);
    let mut tax = Decimal::ZERO;

    for (bracket, upper) in table.ranges() {
        let top = upper.map_or(taxable, |upper| taxable.min(upper));
        if top > bracket.lower_bound {
            tax += (top - bracket.lower_bound) * bracket.rate;
        }
        if upper.is_none_or(|upper| taxable <= upper) {
            break;
        }
    }

    tax
}
