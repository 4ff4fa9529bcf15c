//! Plain-text rendering of calculation results.

use std::fmt;

use afford_core::calculations::common::round_half_up;
use afford_core::{
    AffordabilityResult, BudgetAllocation, HouseholdPlan, LimitReason, StateBreakdown, TaxBreakdown,
    TaxResult,
};
use rust_decimal::Decimal;

const LABEL_WIDTH: usize = 30;

/// `$1,234.56`, with a leading minus for negative amounts.
pub fn money(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// A fractional rate as a percentage: `0.0495` becomes `4.95%`.
pub fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

fn row(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    writeln!(
        f,
        "{:<width$}{value}",
        format!("{label}:"), width = LABEL_WIDTH
    )
}

pub struct TaxReport<'a>(pub &'a TaxResult);

impl fmt::Display for TaxReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let tax = self.0;
        row(f, "Taxable income", money(tax.taxable_income))?;
        row(f, "Federal tax", money(tax.federal_tax))?;
        let state_rate = tax
            .state_details
            .rate
            .map(|rate| format!(" at {}", percent(rate)))
            .unwrap_or_default();
        row(
            f,
            "State tax",
            format!(
                "{} ({}{state_rate})",
                money(tax.state_tax), tax.state_details.mode.as_str()
            ),
        )?;
        row(f, "Net annual", money(tax.net_annual))?;
        row(f, "Monthly take-home", money(tax.monthly_takehome))
    }
}

pub struct BudgetReport<'a>(pub &'a BudgetAllocation);

impl fmt::Display for BudgetReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let budget = self.0;
        writeln!(
            f,
            "Household: {} adult(s), {} kid(s)",
            budget.adults, budget.kids
        )?;
        for (category, amount) in budget.iter() {
            row(f, &category.to_string(), money(amount))?;
        }
        row(
            f,
            "Total budget (excl. savings)",
            money(budget.non_savings_total()),
        )?;
        if budget.overcommitted {
            writeln!(
                f,
                "Note: category shares exceeded take-home and were scaled to fit."
            )?;
        }
        Ok(())
    }
}

pub struct AffordabilityReport<'a>(pub &'a AffordabilityResult);

impl fmt::Display for AffordabilityReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.0;
        row(f, "Max P&I (DTI)", money(result.monthly_pi_dti))?;
        row(f, "Max principal (DTI)", money(result.max_principal_dti))?;
        row(
            f,
            "Max P&I (budget surplus)",
            money(result.monthly_pi_surplus),
        )?;
        row(
            f,
            "Max principal (budget surplus)",
            money(result.max_principal_surplus),
        )?;
        row(f, "P&I used", money(result.monthly_pi_used))?;
        row(f, "Principal used", money(result.max_principal_used))?;
        let reason = match result.limit_reason {
            LimitReason::Dti => "debt-to-income ratio",
            LimitReason::Surplus => "budget surplus",
        };
        row(f, "Limited by", reason)?;
        row(
            f,
            "Assumptions",
            format!(
                "{} over {} years, {} income",
                percent(result.assumptions.rate_annual),
                result.assumptions.term_years,
                result.assumptions.income_basis
            ),
        )
    }
}

fn slices(
    f: &mut fmt::Formatter<'_>,
    breakdown: &TaxBreakdown,
) -> fmt::Result {
    row(f, "Taxable income", money(breakdown.taxable_income))?;
    for slice in &breakdown.slices {
        row(
            f,
            &format!("  {} - {}", money(slice.lower), money(slice.upper)),
            format!(
                "{} x {} = {}",
                money(slice.amount()), percent(slice.rate), money(slice.tax)
            ),
        )?;
    }
    row(f, "Total", money(breakdown.total))
}

pub struct BreakdownReport<'a> {
    pub federal: &'a TaxBreakdown,
    pub state: &'a StateBreakdown,
}

impl fmt::Display for BreakdownReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Federal")?;
        slices(f, self.federal)?;
        writeln!(f)?;
        writeln!(f, "State")?;
        match self.state {
            StateBreakdown::NoTax => writeln!(f, "No state income tax."),
            StateBreakdown::Flat { rate, manual, tax } => {
                let source = if *manual {
                    "manual flat rate"
                } else {
                    "flat rate"
                };
                row(f, "Method", source)?;
                row(f, "Rate", percent(*rate))?;
                row(f, "Total", money(*tax))
            }
            StateBreakdown::Progressive(breakdown) => slices(f, breakdown),
        }
    }
}

pub struct PlanReport<'a>(pub &'a HouseholdPlan);

impl fmt::Display for PlanReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let plan = self.0;
        let cash_flow = &plan.cash_flow;

        writeln!(f, "Taxes")?;
        write!(f, "{}", TaxReport(&plan.tax))?;
        writeln!(f)?;
        writeln!(f, "Budget")?;
        write!(f, "{}", BudgetReport(&plan.budget))?;
        writeln!(f)?;
        writeln!(f, "Mortgage")?;
        write!(f, "{}", AffordabilityReport(&plan.affordability))?;
        writeln!(f)?;
        writeln!(f, "Cash flow")?;
        row(f, "Monthly take-home", money(cash_flow.monthly_takehome))?;
        row(
            f,
            "Total budget (excl. savings)",
            money(cash_flow.base_costs),
        )?;
        row(
            f,
            "Surplus before mortgage",
            money(cash_flow.surplus_before_mortgage),
        )?;
        row(f, "Mortgage P&I", money(cash_flow.mortgage_pi))?;
        row(f, "Total monthly costs", money(cash_flow.total_costs))?;
        let label = if cash_flow.is_deficit() {
            "Deficit"
        } else {
            "Surplus"
        };
        row(f, label, money(cash_flow.cashflow))
    }
}

#[cfg(test)]
mod tests {
    use afford_core::{
        BudgetProfile, FilingStatus, ReferenceData, StateSelection, compute_budget, compute_tax,
        explain_federal, explain_state,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // money / percent tests
    // =========================================================================

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(money(dec!(999.5)), "$999.50");
        assert_eq!(money(dec!(100000)), "$100,000.00");
    }

    #[test]
    fn money_handles_negative_and_zero() {
        assert_eq!(money(dec!(-45)), "-$45.00");
        assert_eq!(money(dec!(0)), "$0.00");
        assert_eq!(money(dec!(-0.001)), "$0.00");
    }

    #[test]
    fn percent_drops_trailing_zeros() {
        assert_eq!(percent(dec!(0.0495)), "4.95%");
        assert_eq!(percent(dec!(0.10)), "10%");
    }

    // =========================================================================
    // report tests
    // =========================================================================

    #[test]
    fn tax_report_lists_every_figure() {
        let reference = ReferenceData::builtin();
        let result = compute_tax(
            &reference,
            dec!(90000),
            FilingStatus::Single,
            &StateSelection::Code("CO".to_string()),
        )
        .unwrap();

        let text = TaxReport(&result).to_string();

        assert!(text.contains("Taxable income:"), "{text}");
        assert!(text.contains("$75,400.00"), "{text}");
        assert!(text.contains("$11,641.00"), "{text}");
        assert!(text.contains("$3,960.00 (flat at 4.4%)"), "{text}");
    }

    #[test]
    fn budget_report_uses_display_names() {
        let budget = compute_budget(dec!(5000), 1, 0, &BudgetProfile::default());

        let text = BudgetReport(&budget).to_string();

        assert!(text.contains("insurance pensions:"), "{text}");
        assert!(text.contains("$1,250.00"), "{text}");
        assert!(!text.contains("scaled to fit"), "{text}");
    }

    #[test]
    fn breakdown_report_shows_slices() {
        let reference = ReferenceData::builtin();
        let federal = explain_federal(&reference, dec!(90000), FilingStatus::Single).unwrap();
        let state = explain_state(
            &reference,
            dec!(90000),
            FilingStatus::Single,
            &StateSelection::Code("TX".to_string()),
        )
        .unwrap();

        let text = BreakdownReport {
            federal: &federal,
            state: &state,
        }
        .to_string();

        assert!(text.contains("$47,150.00 - $75,400.00:"), "{text}");
        assert!(text.contains("$28,250.00 x 22% = $6,215.00"), "{text}");
        assert!(text.contains("No state income tax."), "{text}");
    }
}
