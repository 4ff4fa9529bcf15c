use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use afford_core::{
    BracketTableError, ByFilingStatus, FilingStatus, ReferenceData, StateTaxSpec, TaxBracketTable,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when reading the reference feed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("unknown filing status '{filing_status}' in {section}")]
    UnknownFilingStatus {
        section: &'static str,
        filing_status: String,
    },

    #[error("federal brackets missing for {0}")]
    MissingFederalTable(FilingStatus),

    #[error("standard deduction missing for {0}")]
    MissingStandardDeduction(FilingStatus),

    #[error("standard deduction for {filing_status} is negative: {amount}")]
    NegativeDeduction {
        filing_status: FilingStatus,
        amount: Decimal,
    },

    #[error("state {0} appears in more than one of no_tax, flat_rates and progressive")]
    ConflictingState(String),

    #[error("flat rate for {state} must be between 0 and 1, got {rate}")]
    InvalidFlatRate { state: String, rate: Decimal },

    #[error("invalid {jurisdiction} brackets for {filing_status}: {source}")]
    InvalidTable {
        jurisdiction: String,
        filing_status: FilingStatus,
        #[source]
        source: BracketTableError,
    },
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::JsonParse(err.to_string())
    }
}

/// `[lower_bound, rate]` rows keyed by filing status.
type RawTables = BTreeMap<String, Vec<(Decimal, Decimal)>>;

/// The JSON reference feed, as published.
///
/// ```json
/// {
///   "states": ["CA", "TX"],
///   "no_tax": ["TX"],
///   "flat_rates": { "CO": 0.044 },
///   "progressive": { "CA": { "single": [[0, 0.01], [10412, 0.02]] } },
///   "federal": { "single": [[0, 0.10], [11600, 0.12]] },
///   "standard_deduction": { "single": 14600 }
/// }
/// ```
///
/// Only `federal` and `standard_deduction` are required. `states` lists the
/// codes a front end offers and is informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxFeed {
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub no_tax: Vec<String>,
    #[serde(default)]
    pub flat_rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub progressive: BTreeMap<String, RawTables>,
    #[serde(default)]
    pub federal: RawTables,
    #[serde(default)]
    pub standard_deduction: BTreeMap<String, Decimal>,
}

impl StateTaxFeed {
    /// Parse a feed from a JSON reader, such as a file or a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Self, FeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Validates every table and builds the reference data.
    ///
    /// State codes are normalized to upper case. A state may appear in only
    /// one of `no_tax`, `flat_rates` and `progressive`. Progressive states may
    /// omit filing statuses; using a missing status is reported later as a
    /// configuration gap.
    pub fn into_reference_data(self) -> Result<ReferenceData, FeedError> {
        let federal = parse_status_map("federal", self.federal)?;
        let federal_brackets = ByFilingStatus {
            single: federal_table(&federal, FilingStatus::Single)?,
            married_joint: federal_table(&federal, FilingStatus::MarriedJoint)?,
            head_of_household: federal_table(&federal, FilingStatus::HeadOfHousehold)?,
        };

        let deductions = parse_status_map("standard_deduction", self.standard_deduction)?;
        let standard_deductions = ByFilingStatus {
            single: deduction(&deductions, FilingStatus::Single)?,
            married_joint: deduction(&deductions, FilingStatus::MarriedJoint)?,
            head_of_household: deduction(&deductions, FilingStatus::HeadOfHousehold)?,
        };

        let mut states = BTreeMap::new();
        let mut insert = |code: String, spec: StateTaxSpec| -> Result<(), FeedError> {
            let code = normalize_code(&code);
            if states.contains_key(&code) {
                return Err(FeedError::ConflictingState(code));
            }
            states.insert(code, spec);
            Ok(())
        };

        for code in self.no_tax {
            insert(code, StateTaxSpec::NoTax)?;
        }

        for (code, rate) in self.flat_rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(FeedError::InvalidFlatRate {
                    state: normalize_code(&code),
                    rate,
                });
            }
            insert(code, StateTaxSpec::FlatRate(rate))?;
        }

        for (code, raw_tables) in self.progressive {
            let jurisdiction = normalize_code(&code);
            let mut tables = BTreeMap::new();
            for (filing_status, rows) in parse_status_map("progressive", raw_tables)? {
                let table = build_table(&jurisdiction, filing_status, rows)?;
                tables.insert(filing_status, table);
            }
            if tables.len() < FilingStatus::ALL.len() {
                debug!(
                    state = %jurisdiction,
                    statuses = tables.len(),
                    "progressive state is missing filing statuses"
                );
            }
            insert(code, StateTaxSpec::Progressive(tables))?;
        }

        let listed: BTreeSet<String> = self.states.iter().map(|c| normalize_code(c)).collect();
        for code in listed.iter().filter(|code| !states.contains_key(*code)) {
            warn!(state = %code, "state is listed but has no tax configuration");
        }

        debug!(states = states.len(), "built reference data from feed");

        Ok(ReferenceData {
            federal_brackets,
            standard_deductions,
            states,
        })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn parse_status_map<T>(
    section: &'static str,
    raw: BTreeMap<String, T>,
) -> Result<BTreeMap<FilingStatus, T>, FeedError> {
    raw.into_iter()
        .map(|(key, value)| {
            FilingStatus::parse(key.trim())
                .map(|status| (status, value))
                .ok_or(FeedError::UnknownFilingStatus {
                    section,
                    filing_status: key,
                })
        })
        .collect()
}

fn build_table(
    jurisdiction: &str,
    filing_status: FilingStatus,
    rows: Vec<(Decimal, Decimal)>,
) -> Result<TaxBracketTable, FeedError> {
    TaxBracketTable::from_pairs(rows).map_err(|source| FeedError::InvalidTable {
        jurisdiction: jurisdiction.to_string(),
        filing_status,
        source,
    })
}

fn federal_table(
    federal: &BTreeMap<FilingStatus, Vec<(Decimal, Decimal)>>,
    filing_status: FilingStatus,
) -> Result<TaxBracketTable, FeedError> {
    let rows = federal
        .get(&filing_status)
        .ok_or(FeedError::MissingFederalTable(filing_status))?;
    build_table("federal", filing_status, rows.clone())
}

fn deduction(
    deductions: &BTreeMap<FilingStatus, Decimal>,
    filing_status: FilingStatus,
) -> Result<Decimal, FeedError> {
    let amount = *deductions
        .get(&filing_status)
        .ok_or(FeedError::MissingStandardDeduction(filing_status))?;
    if amount < Decimal::ZERO {
        return Err(FeedError::NegativeDeduction {
            filing_status,
            amount,
        });
    }
    Ok(amount)
}
