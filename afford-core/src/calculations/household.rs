//! One-shot household plan: tax, then budget, then affordability, then the
//! resulting monthly cash flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::affordability::{
    AffordabilityRequest, AffordabilityResult, AffordabilitySolver,
};
use crate::calculations::budget::{BudgetAllocation, BudgetAllocator};
use crate::calculations::common::non_negative;
use crate::calculations::tax::{TaxCalculator, TaxResult};
use crate::error::CalculationError;
use crate::models::{
    BudgetProfile, DtiRatios, FilingStatus, IncomeBasis, LoanTerms, ReferenceData, StateSelection,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdRequest {
    pub gross_income: Decimal,
    pub filing_status: FilingStatus,
    pub state: StateSelection,
    pub adults: u32,
    pub kids: u32,
    pub other_monthly_debt: Decimal,
    pub loan: LoanTerms,
    pub taxes_insurance_monthly: Decimal,
    pub ratios: DtiRatios,
    /// Apply the DTI ratios to take-home pay instead of gross income.
    #[serde(default)]
    pub use_takehome: bool,
}

/// Where the month's take-home goes once the mortgage is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub monthly_takehome: Decimal,
    /// Every budget category except savings.
    pub base_costs: Decimal,
    /// Take-home less base costs, floored at zero.
    pub surplus_before_mortgage: Decimal,
    pub mortgage_pi: Decimal,
    pub total_costs: Decimal,
    /// Take-home less total costs. Negative is a deficit.
    pub cashflow: Decimal,
}

impl CashFlowSummary {
    pub fn new(
        tax: &TaxResult,
        budget: &BudgetAllocation,
        affordability: &AffordabilityResult,
    ) -> Self {
        let monthly_takehome = tax.monthly_takehome;
        let base_costs = budget.non_savings_total();
        let mortgage_pi = affordability.monthly_pi_used;
        let total_costs = base_costs + mortgage_pi;

        Self {
            monthly_takehome,
            base_costs,
            surplus_before_mortgage: non_negative(monthly_takehome - base_costs),
            mortgage_pi,
            total_costs,
            cashflow: monthly_takehome - total_costs,
        }
    }

    pub fn is_deficit(&self) -> bool {
        self.cashflow < Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdPlan {
    pub tax: TaxResult,
    pub budget: BudgetAllocation,
    pub affordability: AffordabilityResult,
    pub cash_flow: CashFlowSummary,
}

pub fn plan_household(
    reference: &ReferenceData,
    profile: &BudgetProfile,
    request: &HouseholdRequest,
) -> Result<HouseholdPlan, CalculationError> {
    let tax = TaxCalculator::new(reference).calculate(
        request.gross_income,
        request.filing_status,
        &request.state,
    )?;

    let budget = BudgetAllocator::new(profile).allocate(
        tax.monthly_takehome,
        request.adults,
        request.kids,
    );
    let surplus_before_mortgage = non_negative(budget.surplus_before_mortgage());
    debug!(%surplus_before_mortgage, "budget leaves surplus for the mortgage");

    let income_basis = if request.use_takehome {
        IncomeBasis::TakeHome(tax.monthly_takehome)
    } else {
        IncomeBasis::Gross
    };
    let affordability_request = AffordabilityRequest {
        annual_income: request.gross_income,
        other_monthly_debt: request.other_monthly_debt,
        loan: request.loan,
        taxes_insurance_monthly: request.taxes_insurance_monthly,
        ratios: request.ratios,
        income_basis,
        surplus_limit: surplus_before_mortgage,
    };
    let affordability = AffordabilitySolver::new(&affordability_request).solve()?;

    let cash_flow = CashFlowSummary::new(&tax, &budget, &affordability);

    Ok(HouseholdPlan {
        tax,
        budget,
        affordability,
        cash_flow,
    })
}
