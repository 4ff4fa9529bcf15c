use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Fixed-rate financing terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub rate_annual: Decimal,
    pub term_years: u32,
}

impl LoanTerms {
    /// Validates that the rate and term describe an amortizing loan.
    pub fn new(
        rate_annual: Decimal,
        term_years: u32,
    ) -> Result<Self, InvalidInput> {
        let terms = Self {
            rate_annual,
            term_years,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.rate_annual <= Decimal::ZERO {
            return Err(InvalidInput::NonPositiveRate(self.rate_annual));
        }
        if self.term_years == 0 {
            return Err(InvalidInput::NonPositiveTerm);
        }
        Ok(())
    }

    pub fn monthly_rate(&self) -> Decimal {
        self.rate_annual / Decimal::from(12)
    }

    pub fn payment_count(&self) -> u64 {
        u64::from(self.term_years) * 12
    }
}

/// Debt-to-income limits: `front_end` covers housing costs only,
/// `back_end` covers housing plus all other debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtiRatios {
    pub front_end: Decimal,
    pub back_end: Decimal,
}

impl DtiRatios {
    pub fn new(
        front_end: Decimal,
        back_end: Decimal,
    ) -> Result<Self, InvalidInput> {
        let ratios = Self {
            front_end,
            back_end,
        };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        for (field, value) in [
            ("front_end_ratio", self.front_end),
            ("back_end_ratio", self.back_end),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(InvalidInput::RateOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Common lender ratio presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtiPreset {
    Conventional,
    Fha,
    Va,
}

impl DtiPreset {
    pub fn ratios(&self) -> DtiRatios {
        let (front_end, back_end) = match self {
            Self::Conventional => (Decimal::new(28, 2), Decimal::new(36, 2)),
            Self::Fha => (Decimal::new(31, 2), Decimal::new(43, 2)),
            // No separate front-end limit; the back-end ratio governs.
            Self::Va => (Decimal::new(41, 2), Decimal::new(41, 2)),
        };
        DtiRatios {
            front_end,
            back_end,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::Fha => "fha",
            Self::Va => "va",
        }
    }
}

impl FromStr for DtiPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conventional" => Ok(Self::Conventional),
            "fha" => Ok(Self::Fha),
            "va" => Ok(Self::Va),
            other => Err(format!("unknown DTI preset '{other}'")),
        }
    }
}

/// Monthly income the DTI ratios are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBasis {
    /// Gross annual income divided by twelve.
    Gross,
    /// The household's monthly take-home pay.
    TakeHome(Decimal),
}

impl IncomeBasis {
    /// Label reported with affordability results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gross => "gross",
            Self::TakeHome(_) => "net",
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn loan_terms_reject_zero_rate() {
        assert_eq!(
            LoanTerms::new(dec!(0), 30),
            Err(InvalidInput::NonPositiveRate(dec!(0)))
        );
    }

    #[test]
    fn loan_terms_reject_zero_term() {
        assert_eq!(
            LoanTerms::new(dec!(0.065), 0),
            Err(InvalidInput::NonPositiveTerm)
        );
    }

    #[test]
    fn loan_terms_derive_monthly_figures() {
        let terms = LoanTerms::new(dec!(0.06), 30).unwrap();

        assert_eq!(terms.monthly_rate(), dec!(0.005));
        assert_eq!(terms.payment_count(), 360);
    }

    #[test]
    fn dti_ratios_reject_values_above_one() {
        assert_eq!(
            DtiRatios::new(dec!(0.28), dec!(1.2)),
            Err(InvalidInput::RateOutOfRange {
                field: "back_end_ratio",
                value: dec!(1.2),
            })
        );
    }

    #[test]
    fn presets_match_lender_guidelines() {
        assert_eq!(
            DtiPreset::Conventional.ratios(),
            DtiRatios {
                front_end: dec!(0.28),
                back_end: dec!(0.36),
            }
        );
        assert_eq!(DtiPreset::Fha.ratios().back_end, dec!(0.43));
        assert_eq!(DtiPreset::Va.ratios().front_end, dec!(0.41));
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("FHA".parse::<DtiPreset>(), Ok(DtiPreset::Fha));
        assert!("jumbo".parse::<DtiPreset>().is_err());
    }

    #[test]
    fn income_basis_labels() {
        assert_eq!(IncomeBasis::Gross.label(), "gross");
        assert_eq!(IncomeBasis::TakeHome(dec!(5000)).label(), "net");
    }
}
