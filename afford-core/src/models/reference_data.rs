use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationGap;
use crate::models::{ByFilingStatus, FilingStatus, StateTaxSpec, TaxBracket, TaxBracketTable};

// 2024 federal schedules: (lower bound, rate in percent).
const FEDERAL_SINGLE: [(i64, i64); 7] = [
    (0, 10),
    (11600, 12),
    (47150, 22),
    (100525, 24),
    (191950, 32),
    (243725, 35),
    (609350, 37),
];

const FEDERAL_MARRIED_JOINT: [(i64, i64); 7] = [
    (0, 10),
    (23200, 12),
    (94300, 22),
    (201050, 24),
    (383900, 32),
    (487450, 35),
    (731200, 37),
];

const FEDERAL_HEAD_OF_HOUSEHOLD: [(i64, i64); 7] = [
    (0, 10),
    (16550, 12),
    (63100, 22),
    (100500, 24),
    (191950, 32),
    (243700, 35),
    (609350, 37),
];

const NO_TAX_STATES: [&str; 9] = ["AK", "FL", "NV", "SD", "TN", "TX", "WA", "WY", "NH"];

// (state, rate mantissa, rate scale)
const FLAT_RATE_STATES: [(&str, i64, u32); 9] = [
    ("CO", 44, 3),
    ("IL", 495, 4),
    ("IN", 315, 4),
    ("KY", 4, 2),
    ("MA", 5, 2),
    ("MI", 425, 4),
    ("NC", 45, 3),
    ("PA", 307, 4),
    ("UT", 465, 4),
];

/// Federal and state tax tables supplied to the calculators.
///
/// The calculators never fetch or cache this data; callers build it from a
/// reference feed or fall back to [`ReferenceData::builtin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub federal_brackets: ByFilingStatus<TaxBracketTable>,
    pub standard_deductions: ByFilingStatus<Decimal>,
    pub states: BTreeMap<String, StateTaxSpec>,
}

impl ReferenceData {
    /// The fallback table used when no reference feed is available: 2024
    /// federal brackets and deductions, no-tax states and flat-rate states.
    /// Progressive states are not included.
    pub fn builtin() -> Self {
        let mut states = BTreeMap::new();
        for code in NO_TAX_STATES {
            states.insert(code.to_string(), StateTaxSpec::NoTax);
        }
        for (code, mantissa, scale) in FLAT_RATE_STATES {
            states.insert(
                code.to_string(),
                StateTaxSpec::FlatRate(Decimal::new(mantissa, scale)),
            );
        }

        Self {
            federal_brackets: ByFilingStatus {
                single: percent_table(&FEDERAL_SINGLE),
                married_joint: percent_table(&FEDERAL_MARRIED_JOINT),
                head_of_household: percent_table(&FEDERAL_HEAD_OF_HOUSEHOLD),
            },
            standard_deductions: ByFilingStatus {
                single: Decimal::from(14600),
                married_joint: Decimal::from(29200),
                head_of_household: Decimal::from(21900),
            },
            states,
        }
    }

    pub fn federal_table(
        &self,
        status: FilingStatus,
    ) -> &TaxBracketTable {
        self.federal_brackets.get(status)
    }

    pub fn standard_deduction(
        &self,
        status: FilingStatus,
    ) -> Decimal {
        *self.standard_deductions.get(status)
    }

    /// Looks up a state by code (case-insensitive).
    pub fn state_spec(
        &self,
        code: &str,
    ) -> Result<&StateTaxSpec, ConfigurationGap> {
        let code = code.trim().to_ascii_uppercase();
        self.states
            .get(&code)
            .ok_or(ConfigurationGap::UnknownState(code))
    }

    pub fn state_codes(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

fn percent_table(rows: &[(i64, i64)]) -> TaxBracketTable {
    TaxBracketTable::new_unchecked(
        rows.iter()
            .map(|&(lower, percent)| {
                TaxBracket::new(Decimal::from(lower), Decimal::new(percent, 2))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn builtin_federal_tables_pass_validation() {
        let data = ReferenceData::builtin();

        for status in FilingStatus::ALL {
            let brackets = data.federal_table(status).brackets().to_vec();
            assert_eq!(TaxBracketTable::new(brackets).map(|t| t.len()), Ok(7));
        }
    }

    #[test]
    fn builtin_standard_deductions() {
        let data = ReferenceData::builtin();

        assert_eq!(data.standard_deduction(FilingStatus::Single), dec!(14600));
        assert_eq!(
            data.standard_deduction(FilingStatus::MarriedJoint),
            dec!(29200)
        );
        assert_eq!(
            data.standard_deduction(FilingStatus::HeadOfHousehold),
            dec!(21900)
        );
    }

    #[test]
    fn state_spec_resolves_codes_case_insensitively() {
        let data = ReferenceData::builtin();

        assert_eq!(data.state_spec("tx"), Ok(&StateTaxSpec::NoTax));
        assert_eq!(
            data.state_spec("IL"),
            Ok(&StateTaxSpec::FlatRate(dec!(0.0495)))
        );
    }

    #[test]
    fn state_spec_reports_unknown_state() {
        let data = ReferenceData::builtin();

        assert_eq!(
            data.state_spec("ZZ"),
            Err(ConfigurationGap::UnknownState("ZZ".to_string()))
        );
    }

    #[test]
    fn builtin_has_eighteen_states() {
        assert_eq!(ReferenceData::builtin().state_codes().count(), 18);
    }
}
