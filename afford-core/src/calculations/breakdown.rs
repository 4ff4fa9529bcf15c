//! Per-bracket explanation of a tax figure.
//!
//! The breakdown re-walks the same table the tax calculator used and reports
//! each slice of income with its rate and the tax it produced. Its `total`
//! always equals the liability reported by
//! [`TaxCalculator`](crate::calculations::TaxCalculator) for the same inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::tax::{progressive_table, validate_rate};
use crate::error::{CalculationError, InvalidInput};
use crate::models::{FilingStatus, ReferenceData, StateSelection, StateTaxSpec, TaxBracketTable};

/// Income between `lower` and `upper` taxed at `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower: Decimal,
    pub upper: Decimal,
    pub rate: Decimal,
    pub tax: Decimal,
}

impl BracketSlice {
    pub fn amount(&self) -> Decimal {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub taxable_income: Decimal,
    /// Slices in increasing bracket order. Slice taxes are in cents and sum
    /// to `total`; any rounding remainder is carried by the last slice.
    pub slices: Vec<BracketSlice>,
    /// Unrounded bracket tax, rounded once to cents.
    pub total: Decimal,
}

impl TaxBreakdown {
    /// Splits `taxable_income` across the brackets of `table`.
    pub fn from_table(
        taxable_income: Decimal,
        table: &TaxBracketTable,
    ) -> Self {
        let taxable = non_negative(taxable_income);
        let mut slices = Vec::new();
        let mut previous_upper = Decimal::ZERO;

        for (bracket, next_lower) in table.ranges() {
            let lower = previous_upper.max(bracket.lower_bound);
            let upper = next_lower.map_or(taxable, |next| taxable.min(next));
            if upper > lower {
                slices.push(BracketSlice {
                    lower,
                    upper,
                    rate: bracket.rate,
                    tax: (upper - lower) * bracket.rate,
                });
            }
            match next_lower {
                Some(next) if taxable > next => previous_upper = next,
                _ => break,
            }
        }

        let total = round_half_up(slices.iter().map(|slice| slice.tax).sum());
        for slice in &mut slices {
            slice.tax = round_half_up(slice.tax);
        }
        let rounded: Decimal = slices.iter().map(|slice| slice.tax).sum();
        if let Some(last) = slices.last_mut() {
            last.tax += total - rounded;
        }

        Self {
            taxable_income: taxable,
            slices,
            total,
        }
    }
}

/// Explanation of the state figure, by state mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum StateBreakdown {
    NoTax,
    Flat {
        rate: Decimal,
        /// True when the rate was entered by hand rather than looked up.
        manual: bool,
        tax: Decimal,
    },
    Progressive(TaxBreakdown),
}

impl StateBreakdown {
    pub fn total(&self) -> Decimal {
        match self {
            Self::NoTax => Decimal::ZERO,
            Self::Flat { tax, .. } => *tax,
            Self::Progressive(breakdown) => breakdown.total,
        }
    }
}

/// Bracket-by-bracket federal tax for `gross_income`.
pub fn explain_federal(
    reference: &ReferenceData,
    gross_income: Decimal,
    filing_status: FilingStatus,
) -> Result<TaxBreakdown, CalculationError> {
    if gross_income < Decimal::ZERO {
        return Err(InvalidInput::NegativeIncome(gross_income).into());
    }
    let taxable = non_negative(gross_income - reference.standard_deduction(filing_status));
    Ok(TaxBreakdown::from_table(
        taxable,
        reference.federal_table(filing_status),
    ))
}

/// Explains the state figure for `gross_income`.
pub fn explain_state(
    reference: &ReferenceData,
    gross_income: Decimal,
    filing_status: FilingStatus,
    state: &StateSelection,
) -> Result<StateBreakdown, CalculationError> {
    if gross_income < Decimal::ZERO {
        return Err(InvalidInput::NegativeIncome(gross_income).into());
    }

    let code = match state {
        StateSelection::ManualRate(rate) => {
            validate_rate(*rate)?;
            return Ok(StateBreakdown::Flat {
                rate: *rate,
                manual: true,
                tax: round_half_up(gross_income * *rate),
            });
        }
        StateSelection::Code(code) => code,
    };

    let breakdown = match reference.state_spec(code)? {
        StateTaxSpec::NoTax => StateBreakdown::NoTax,
        StateTaxSpec::FlatRate(rate) => StateBreakdown::Flat {
            rate: *rate,
            manual: false,
            tax: round_half_up(gross_income * *rate),
        },
        StateTaxSpec::Progressive(tables) => {
            let table = progressive_table(code, tables.get(&filing_status), filing_status)?;
            let taxable = non_negative(gross_income - reference.standard_deduction(filing_status));
            StateBreakdown::Progressive(TaxBreakdown::from_table(taxable, table))
        }
    };
    Ok(breakdown)
}
