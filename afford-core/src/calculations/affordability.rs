//! Maximum mortgage under two independent caps.
//!
//! | Cap | Monthly principal & interest |
//! |-----|------------------------------|
//! | DTI | min(income × front − T&I, income × back − other debt − T&I), floored at 0 |
//! | Surplus | surplus left after the household budget, floored at 0 |
//!
//! Each cap is converted into a principal with the standard amortization
//! formula `P = PI × (1 − (1 + m)^−n) / m`. The smaller cap wins; on a tie
//! the DTI cap is reported as the limit.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::error::{CalculationError, InvalidInput};
use crate::models::{DtiRatios, IncomeBasis, LoanTerms};

/// Monthly rates below this are treated as interest-free.
pub const NEAR_ZERO_MONTHLY_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 12);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordabilityRequest {
    /// Gross annual income; used for the DTI cap when the basis is `Gross`.
    pub annual_income: Decimal,
    pub other_monthly_debt: Decimal,
    pub loan: LoanTerms,
    /// Property taxes plus homeowner's insurance, per month.
    pub taxes_insurance_monthly: Decimal,
    pub ratios: DtiRatios,
    pub income_basis: IncomeBasis,
    /// Monthly cash left after the household budget. May be negative.
    pub surplus_limit: Decimal,
}

impl AffordabilityRequest {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.annual_income < Decimal::ZERO {
            return Err(InvalidInput::NegativeIncome(self.annual_income));
        }
        for (field, value) in [
            ("other_monthly_debt", self.other_monthly_debt),
            ("taxes_insurance_monthly", self.taxes_insurance_monthly),
        ] {
            if value < Decimal::ZERO {
                return Err(InvalidInput::NegativeAmount { field, value });
            }
        }
        self.loan.validate()?;
        self.ratios.validate()
    }

    /// Monthly income the DTI ratios are applied to.
    pub fn monthly_income(&self) -> Decimal {
        match self.income_basis {
            IncomeBasis::Gross => self.annual_income / Decimal::from(12),
            IncomeBasis::TakeHome(monthly) => non_negative(monthly),
        }
    }
}

/// A monthly principal-and-interest ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordabilityConstraint {
    Dti {
        ratios: DtiRatios,
        other_monthly_debt: Decimal,
        taxes_insurance_monthly: Decimal,
        monthly_income: Decimal,
    },
    Surplus {
        surplus_limit: Decimal,
    },
}

impl AffordabilityConstraint {
    /// Largest monthly P&I payment this constraint allows, never negative.
    ///
    /// # Errors
    ///
    /// [`InvalidInput::AmountTooLarge`] if the cap does not fit in a `Decimal`.
    pub fn monthly_cap(&self) -> Result<Decimal, InvalidInput> {
        match *self {
            Self::Dti {
                ratios,
                other_monthly_debt,
                taxes_insurance_monthly,
                monthly_income,
            } => {
                let too_large = || InvalidInput::AmountTooLarge("monthly_pi_dti");
                let front = monthly_income
                    .checked_mul(ratios.front_end)
                    .and_then(|share| share.checked_sub(taxes_insurance_monthly))
                    .ok_or_else(too_large)?;
                let back = monthly_income
                    .checked_mul(ratios.back_end)
                    .and_then(|share| share.checked_sub(other_monthly_debt))
                    .and_then(|rest| rest.checked_sub(taxes_insurance_monthly))
                    .ok_or_else(too_large)?;
                Ok(non_negative(front.min(back)))
            }
            Self::Surplus { surplus_limit } => Ok(non_negative(surplus_limit)),
        }
    }
}

/// Which cap produced the final figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitReason {
    Dti,
    Surplus,
}

impl LimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dti => "dti",
            Self::Surplus => "surplus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordabilityAssumptions {
    pub rate_annual: Decimal,
    pub term_years: u32,
    /// `gross` or `net`.
    pub income_basis: String,
}

/// Monthly payments and principals are rounded to cents.
///
/// Payment fields serialize as `monthly_PI_*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordabilityResult {
    #[serde(rename = "monthly_PI_dti")]
    pub monthly_pi_dti: Decimal,
    pub max_principal_dti: Decimal,
    #[serde(rename = "monthly_PI_surplus")]
    pub monthly_pi_surplus: Decimal,
    pub max_principal_surplus: Decimal,
    #[serde(rename = "monthly_PI_used")]
    pub monthly_pi_used: Decimal,
    pub max_principal_used: Decimal,
    pub limit_reason: LimitReason,
    pub assumptions: AffordabilityAssumptions,
}

/// Principal that a level monthly payment of `monthly_pi` retires over `loan`.
///
/// Falls back to `monthly_pi × n` for effectively interest-free loans. When
/// `(1 + m)^n` is too large to represent, the discount term is treated as 0.
///
/// # Errors
///
/// [`InvalidInput::AmountTooLarge`] if the principal does not fit in a `Decimal`.
pub fn principal_for_payment(
    monthly_pi: Decimal,
    loan: &LoanTerms,
) -> Result<Decimal, InvalidInput> {
    let monthly_rate = loan.monthly_rate();
    let payments = loan.payment_count();
    let too_large = || InvalidInput::AmountTooLarge("max_principal");

    if monthly_rate < NEAR_ZERO_MONTHLY_RATE {
        return monthly_pi
            .checked_mul(Decimal::from(payments))
            .ok_or_else(too_large);
    }

    let discount = match (Decimal::ONE + monthly_rate).checked_powu(payments) {
        Some(growth) => Decimal::ONE.checked_div(growth).unwrap_or(Decimal::ZERO),
        None => {
            debug!(
                %monthly_rate,
                payments,
                "amortization growth overflowed; discount taken as zero"
            );
            Decimal::ZERO
        }
    };
    monthly_pi
        .checked_mul(Decimal::ONE - discount)
        .and_then(|retired| retired.checked_div(monthly_rate))
        .ok_or_else(too_large)
}

/// Solves both caps for one request.
#[derive(Debug, Clone, Copy)]
pub struct AffordabilitySolver<'a> {
    request: &'a AffordabilityRequest,
}

impl<'a> AffordabilitySolver<'a> {
    pub fn new(request: &'a AffordabilityRequest) -> Self {
        Self { request }
    }

    pub fn dti_constraint(&self) -> AffordabilityConstraint {
        AffordabilityConstraint::Dti {
            ratios: self.request.ratios,
            other_monthly_debt: self.request.other_monthly_debt,
            taxes_insurance_monthly: self.request.taxes_insurance_monthly,
            monthly_income: self.request.monthly_income(),
        }
    }

    pub fn surplus_constraint(&self) -> AffordabilityConstraint {
        AffordabilityConstraint::Surplus {
            surplus_limit: self.request.surplus_limit,
        }
    }

    pub fn solve(&self) -> Result<AffordabilityResult, CalculationError> {
        let request = self.request;
        request.validate()?;

        let monthly_pi_dti = round_half_up(self.dti_constraint().monthly_cap()?);
        let monthly_pi_surplus = round_half_up(self.surplus_constraint().monthly_cap()?);

        let (monthly_pi_used, limit_reason) = if monthly_pi_surplus < monthly_pi_dti {
            (monthly_pi_surplus, LimitReason::Surplus)
        } else {
            (monthly_pi_dti, LimitReason::Dti)
        };

        let principal = |pi| principal_for_payment(pi, &request.loan).map(round_half_up);
        let result = AffordabilityResult {
            monthly_pi_dti,
            max_principal_dti: principal(monthly_pi_dti)?,
            monthly_pi_surplus,
            max_principal_surplus: principal(monthly_pi_surplus)?,
            monthly_pi_used,
            max_principal_used: principal(monthly_pi_used)?,
            limit_reason,
            assumptions: AffordabilityAssumptions {
                rate_annual: request.loan.rate_annual,
                term_years: request.loan.term_years,
                income_basis: request.income_basis.label().to_string(),
            },
        };

        debug!(
            pi_dti = %result.monthly_pi_dti,
            pi_surplus = %result.monthly_pi_surplus,
            principal = %result.max_principal_used,
            limit = limit_reason.as_str(),
            "solved affordability"
        );

        Ok(result)
    }
}

/// Convenience entry point over [`AffordabilitySolver`].
pub fn compute_affordability(
    request: &AffordabilityRequest,
) -> Result<AffordabilityResult, CalculationError> {
    AffordabilitySolver::new(request).solve()
}
