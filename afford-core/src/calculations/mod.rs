//! Household affordability calculations.
//!
//! Each calculator borrows its inputs and returns a plain result value. The
//! `compute_*` functions are thin entry points over the calculator types.

pub mod affordability;
pub mod breakdown;
pub mod budget;
pub mod common;
pub mod household;
pub mod tax;

pub use affordability::{
    AffordabilityAssumptions, AffordabilityConstraint, AffordabilityRequest, AffordabilityResult,
    AffordabilitySolver, LimitReason, NEAR_ZERO_MONTHLY_RATE, compute_affordability,
    principal_for_payment,
};
pub use breakdown::{BracketSlice, StateBreakdown, TaxBreakdown, explain_federal, explain_state};
pub use budget::{BudgetAllocation, BudgetAllocator, compute_budget};
pub use household::{CashFlowSummary, HouseholdPlan, HouseholdRequest, plan_household};
pub use tax::{TaxCalculator, TaxResult, compute_tax, marginal_tax};
