use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monthly spending categories, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Housing,
    Transportation,
    Food,
    InsurancePensions,
    Healthcare,
    Entertainment,
    CashContributions,
    Apparel,
    Education,
    Miscellaneous,
    Savings,
}

impl BudgetCategory {
    pub const ALL: [BudgetCategory; 11] = [
        BudgetCategory::Housing,
        BudgetCategory::Transportation,
        BudgetCategory::Food,
        BudgetCategory::InsurancePensions,
        BudgetCategory::Healthcare,
        BudgetCategory::Entertainment,
        BudgetCategory::CashContributions,
        BudgetCategory::Apparel,
        BudgetCategory::Education,
        BudgetCategory::Miscellaneous,
        BudgetCategory::Savings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Housing => "housing",
            Self::Transportation => "transportation",
            Self::Food => "food",
            Self::InsurancePensions => "insurance_pensions",
            Self::Healthcare => "healthcare",
            Self::Entertainment => "entertainment",
            Self::CashContributions => "cash_contributions",
            Self::Apparel => "apparel",
            Self::Education => "education",
            Self::Miscellaneous => "miscellaneous",
            Self::Savings => "savings",
        }
    }

    pub fn is_savings(&self) -> bool {
        matches!(self, Self::Savings)
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.as_str().replace('_', " "))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetProfileError {
    #[error("savings is the residual category and cannot carry a weight")]
    SavingsWeighted,

    #[error("{category}: {field} must be non-negative, got {value}")]
    NegativeWeight {
        category: BudgetCategory,
        field: &'static str,
        value: Decimal,
    },
}

/// Share of take-home assigned to one category, and how that share grows
/// with household size.
///
/// The multiplier is `1 + adult_weight * (adults - 1) + kid_weight * kids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub base_share: Decimal,
    #[serde(default)]
    pub adult_weight: Decimal,
    #[serde(default)]
    pub kid_weight: Decimal,
}

impl CategoryWeight {
    fn validate(
        &self,
        category: BudgetCategory,
    ) -> Result<(), BudgetProfileError> {
        let fields = [
            ("base_share", self.base_share),
            ("adult_weight", self.adult_weight),
            ("kid_weight", self.kid_weight),
        ];
        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(BudgetProfileError::NegativeWeight {
                    category,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Household-size multiplier for this category.
    pub fn multiplier(
        &self,
        adults: u32,
        kids: u32,
    ) -> Decimal {
        let extra_adults = Decimal::from(adults.saturating_sub(1));
        Decimal::ONE + self.adult_weight * extra_adults + self.kid_weight * Decimal::from(kids)
    }
}

// (category, base share in basis points, adult weight %, kid weight %)
const DEFAULT_WEIGHTS: [(BudgetCategory, i64, i64, i64); 10] = [
    (BudgetCategory::Housing, 2500, 0, 0),
    (BudgetCategory::Transportation, 1200, 15, 5),
    (BudgetCategory::Food, 1000, 50, 30),
    (BudgetCategory::InsurancePensions, 800, 0, 0),
    (BudgetCategory::Healthcare, 600, 40, 25),
    (BudgetCategory::Entertainment, 400, 20, 10),
    (BudgetCategory::CashContributions, 200, 0, 0),
    (BudgetCategory::Apparel, 200, 40, 30),
    (BudgetCategory::Education, 100, 10, 40),
    (BudgetCategory::Miscellaneous, 200, 10, 10),
];

/// Category weights used by the budget allocator. Savings is never weighted;
/// it receives whatever the other categories leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<BudgetCategory, CategoryWeight>")]
#[serde(into = "BTreeMap<BudgetCategory, CategoryWeight>")]
pub struct BudgetProfile {
    weights: BTreeMap<BudgetCategory, CategoryWeight>,
}

impl BudgetProfile {
    pub fn new(
        weights: BTreeMap<BudgetCategory, CategoryWeight>,
    ) -> Result<Self, BudgetProfileError> {
        for (category, weight) in &weights {
            if category.is_savings() {
                return Err(BudgetProfileError::SavingsWeighted);
            }
            weight.validate(*category)?;
        }
        Ok(Self { weights })
    }

    /// Replaces the weights of the given categories, keeping the rest.
    pub fn with_overrides(
        mut self,
        overrides: BTreeMap<BudgetCategory, CategoryWeight>,
    ) -> Result<Self, BudgetProfileError> {
        self.weights.extend(overrides);
        Self::new(self.weights)
    }

    pub fn weight(
        &self,
        category: BudgetCategory,
    ) -> Option<&CategoryWeight> {
        self.weights.get(&category)
    }

    pub fn weights(&self) -> impl Iterator<Item = (BudgetCategory, &CategoryWeight)> {
        self.weights
            .iter()
            .map(|(category, weight)| (*category, weight))
    }
}

impl Default for BudgetProfile {
    fn default() -> Self {
        let weights = DEFAULT_WEIGHTS
            .iter()
            .map(|&(category, share_bp, adult_pct, kid_pct)| {
                (
                    category,
                    CategoryWeight {
                        base_share: Decimal::new(share_bp, 4),
                        adult_weight: Decimal::new(adult_pct, 2),
                        kid_weight: Decimal::new(kid_pct, 2),
                    },
                )
            })
            .collect();
        Self { weights }
    }
}

impl TryFrom<BTreeMap<BudgetCategory, CategoryWeight>> for BudgetProfile {
    type Error = BudgetProfileError;

    fn try_from(weights: BTreeMap<BudgetCategory, CategoryWeight>) -> Result<Self, Self::Error> {
        Self::new(weights)
    }
}

impl From<BudgetProfile> for BTreeMap<BudgetCategory, CategoryWeight> {
    fn from(profile: BudgetProfile) -> Self {
        profile.weights
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn weight(base_share: Decimal) -> CategoryWeight {
        CategoryWeight {
            base_share,
            adult_weight: Decimal::ZERO,
            kid_weight: Decimal::ZERO,
        }
    }

    #[test]
    fn default_profile_covers_every_category_but_savings() {
        let profile = BudgetProfile::default();

        for category in BudgetCategory::ALL {
            assert_eq!(profile.weight(category).is_some(), !category.is_savings());
        }
    }

    #[test]
    fn default_base_shares_leave_room_for_savings() {
        let total: Decimal = BudgetProfile::default()
            .weights()
            .map(|(_, w)| w.base_share)
            .sum();

        assert_eq!(total, dec!(0.72));
    }

    #[test]
    fn multiplier_scales_with_extra_adults_and_kids() {
        let food = BudgetProfile::default()
            .weight(BudgetCategory::Food)
            .copied()
            .unwrap();

        assert_eq!(food.multiplier(1, 0), dec!(1));
        // 1 + 0.5 * 1 + 0.3 * 2
        assert_eq!(food.multiplier(2, 2), dec!(2.1));
    }

    #[test]
    fn multiplier_treats_zero_adults_as_one() {
        let food = BudgetProfile::default()
            .weight(BudgetCategory::Food)
            .copied()
            .unwrap();

        assert_eq!(food.multiplier(0, 0), dec!(1));
    }

    #[test]
    fn new_rejects_savings_weight() {
        let weights = BTreeMap::from([(BudgetCategory::Savings, weight(dec!(0.1)))]);

        assert_eq!(
            BudgetProfile::new(weights),
            Err(BudgetProfileError::SavingsWeighted)
        );
    }

    #[test]
    fn new_rejects_negative_share() {
        let weights = BTreeMap::from([(BudgetCategory::Food, weight(dec!(-0.1)))]);

        assert_eq!(
            BudgetProfile::new(weights),
            Err(BudgetProfileError::NegativeWeight {
                category: BudgetCategory::Food,
                field: "base_share",
                value: dec!(-0.1),
            })
        );
    }

    #[test]
    fn with_overrides_replaces_only_named_categories() {
        let overrides = BTreeMap::from([(BudgetCategory::Housing, weight(dec!(0.30)))]);

        let profile = BudgetProfile::default().with_overrides(overrides).unwrap();

        assert_eq!(
            profile.weight(BudgetCategory::Housing).unwrap().base_share,
            dec!(0.30)
        );
        assert_eq!(
            profile.weight(BudgetCategory::Food).unwrap().base_share,
            dec!(0.10)
        );
    }

    #[test]
    fn display_replaces_underscores() {
        assert_eq!(
            BudgetCategory::InsurancePensions.to_string(),
            "insurance pensions"
        );
    }
}
