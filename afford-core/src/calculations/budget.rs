//! Proportional monthly budget.
//!
//! Every weighted category receives a share of take-home pay, scaled by a
//! household-size multiplier taken from the [`BudgetProfile`]. Savings is the
//! residual after the weighted categories, floored at zero.
//!
//! If the scaled shares add up to more than the whole take-home, they are
//! scaled back proportionally so the categories exactly fill it, savings is
//! zero, and the allocation is marked `overcommitted`.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use afford_core::calculations::BudgetAllocator;
//! use afford_core::{BudgetCategory, BudgetProfile};
//!
//! let profile = BudgetProfile::default();
//! let allocation = BudgetAllocator::new(&profile).allocate(dec!(5000), 1, 0);
//!
//! assert_eq!(allocation.get(BudgetCategory::Housing), dec!(1250.00));
//! assert_eq!(allocation.get(BudgetCategory::Savings), dec!(1400.00));
//! assert!(!allocation.overcommitted);
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{non_negative, round_down};
use crate::models::{BudgetCategory, BudgetProfile};

/// Monthly amount per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub monthly_takehome: Decimal,
    pub adults: u32,
    pub kids: u32,
    pub allocations: BTreeMap<BudgetCategory, Decimal>,
    /// The weighted shares asked for more than the whole take-home and were
    /// scaled back to fit.
    pub overcommitted: bool,
}

impl BudgetAllocation {
    /// Amount for a category; zero for categories the profile does not weight.
    pub fn get(
        &self,
        category: BudgetCategory,
    ) -> Decimal {
        self.allocations
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of every category except savings.
    pub fn non_savings_total(&self) -> Decimal {
        self.allocations
            .iter()
            .filter(|(category, _)| !category.is_savings())
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Take-home left after the non-savings categories. Negative when the
    /// take-home itself is negative.
    pub fn surplus_before_mortgage(&self) -> Decimal {
        self.monthly_takehome - self.non_savings_total()
    }

    /// Categories in display order, including savings.
    pub fn iter(&self) -> impl Iterator<Item = (BudgetCategory, Decimal)> + '_ {
        BudgetCategory::ALL
            .into_iter()
            .filter(|category| self.allocations.contains_key(category))
            .map(|category| (category, self.get(category)))
    }
}

/// Splits take-home pay across the categories of a [`BudgetProfile`].
#[derive(Debug, Clone, Copy)]
pub struct BudgetAllocator<'a> {
    profile: &'a BudgetProfile,
}

impl<'a> BudgetAllocator<'a> {
    pub fn new(profile: &'a BudgetProfile) -> Self {
        Self { profile }
    }

    /// Allocates `monthly_takehome` for a household of `adults` and `kids`.
    ///
    /// `adults` below one is treated as one. A negative take-home allocates
    /// zero to every category.
    pub fn allocate(
        &self,
        monthly_takehome: Decimal,
        adults: u32,
        kids: u32,
    ) -> BudgetAllocation {
        let adults = adults.max(1);
        let income = non_negative(monthly_takehome);

        let shares: Vec<(BudgetCategory, Decimal)> = self
            .profile
            .weights()
            .map(|(category, weight)| {
                (category, weight.base_share * weight.multiplier(adults, kids))
            })
            .collect();
        let total_share: Decimal = shares.iter().map(|(_, share)| *share).sum();

        let overcommitted = total_share > Decimal::ONE;
        if overcommitted {
            warn!(
                %total_share,
                adults,
                kids,
                "budget shares exceed take-home; scaling categories to fit"
            );
        }

        let mut allocations: BTreeMap<BudgetCategory, Decimal> = shares
            .into_iter()
            .map(|(category, share)| {
                let share = if overcommitted {
                    share / total_share
                } else {
                    share
                };
                (category, round_down(income * share))
            })
            .collect();

        let spent: Decimal = allocations.values().copied().sum();
        let savings = non_negative(monthly_takehome - spent);
        allocations.insert(BudgetCategory::Savings, savings);

        debug!(%monthly_takehome, adults, kids, %spent, %savings, "allocated budget");

        BudgetAllocation {
            monthly_takehome,
            adults,
            kids,
            allocations,
            overcommitted,
        }
    }
}

/// Convenience entry point over [`BudgetAllocator`].
pub fn compute_budget(
    monthly_takehome: Decimal,
    adults: u32,
    kids: u32,
    profile: &BudgetProfile,
) -> BudgetAllocation {
    BudgetAllocator::new(profile).allocate(monthly_takehome, adults, kids)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::CategoryWeight;

    fn heavy_profile() -> BudgetProfile {
        let weight = CategoryWeight {
            base_share: dec!(0.40),
            adult_weight: dec!(0.5),
            kid_weight: dec!(0.5),
        };
        BudgetProfile::new(BTreeMap::from([
            (BudgetCategory::Housing, weight),
            (BudgetCategory::Food, weight),
        ]))
        .unwrap()
    }

    #[test]
    fn single_adult_gets_base_shares() {
        let profile = BudgetProfile::default();

        let allocation = compute_budget(dec!(5000), 1, 0, &profile);

        assert_eq!(allocation.get(BudgetCategory::Housing), dec!(1250.00));
        assert_eq!(allocation.get(BudgetCategory::Food), dec!(500.00));
        assert_eq!(allocation.non_savings_total(), dec!(3600.00));
        assert_eq!(allocation.get(BudgetCategory::Savings), dec!(1400.00));
        assert_eq!(allocation.surplus_before_mortgage(), dec!(1400.00));
    }

    #[test]
    fn household_size_scales_variable_categories_only() {
        let profile = BudgetProfile::default();

        let single = compute_budget(dec!(6000), 1, 0, &profile);
        let family = compute_budget(dec!(6000), 2, 2, &profile);

        assert_eq!(
            family.get(BudgetCategory::Housing),
            single.get(BudgetCategory::Housing)
        );
        // 0.10 * (1 + 0.5 + 0.6) * 6000
        assert_eq!(family.get(BudgetCategory::Food), dec!(1260.00));
        assert!(
            family.get(BudgetCategory::Savings) < single.get(BudgetCategory::Savings)
        );
    }

    #[test]
    fn zero_adults_coerced_to_one() {
        let profile = BudgetProfile::default();

        let allocation = compute_budget(dec!(4000), 0, 0, &profile);

        assert_eq!(allocation.adults, 1);
        assert_eq!(allocation, compute_budget(dec!(4000), 1, 0, &profile));
    }

    #[test]
    fn negative_takehome_allocates_nothing() {
        let profile = BudgetProfile::default();

        let allocation = compute_budget(dec!(-250), 1, 0, &profile);

        assert!(allocation.iter().all(|(_, amount)| amount == Decimal::ZERO));
        assert_eq!(allocation.surplus_before_mortgage(), dec!(-250));
    }

    #[test]
    fn overcommitted_shares_are_scaled_to_fit() {
        let profile = heavy_profile();

        // each share: 0.40 * (1 + 0.5 + 0.5) = 0.80, total 1.60
        let allocation = compute_budget(dec!(3000), 2, 1, &profile);

        assert!(allocation.overcommitted);
        assert_eq!(allocation.get(BudgetCategory::Housing), dec!(1500.00));
        assert_eq!(allocation.get(BudgetCategory::Food), dec!(1500.00));
        assert_eq!(allocation.get(BudgetCategory::Savings), dec!(0));
    }

    #[test]
    fn allocations_round_toward_zero() {
        let profile = BudgetProfile::default();

        let allocation = compute_budget(dec!(1000.99), 1, 0, &profile);

        // 1000.99 * 0.25 = 250.2475
        assert_eq!(allocation.get(BudgetCategory::Housing), dec!(250.24));
    }

    #[test]
    fn iter_follows_display_order() {
        let profile = BudgetProfile::default();

        let allocation = compute_budget(dec!(5000), 1, 0, &profile);
        let order: Vec<_> = allocation.iter().map(|(category, _)| category).collect();

        assert_eq!(order, BudgetCategory::ALL.to_vec());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_allocation_never_exceeds_takehome(
            takehome_cents in 0i64..5_000_000,
            adults in 0u32..12,
            kids in 0u32..12,
        ) {
            let takehome = Decimal::new(takehome_cents, 2);

            for profile in [BudgetProfile::default(), heavy_profile()] {
                let allocation = compute_budget(takehome, adults, kids, &profile);

                prop_assert!(allocation.non_savings_total() <= takehome);
                prop_assert!(allocation.get(BudgetCategory::Savings) >= Decimal::ZERO);
                prop_assert!(allocation.iter().all(|(_, amount)| amount >= Decimal::ZERO));
            }
        }
    }
}
