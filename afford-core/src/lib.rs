pub mod calculations;
pub mod error;
pub mod models;

pub use calculations::{
    AffordabilityRequest, AffordabilityResult, BudgetAllocation, CashFlowSummary, HouseholdPlan,
    HouseholdRequest, LimitReason, StateBreakdown, TaxBreakdown, TaxResult, compute_affordability,
    compute_budget, compute_tax, explain_federal, explain_state, plan_household,
};
pub use error::{CalculationError, ConfigurationGap, InvalidInput};
pub use models::*;
