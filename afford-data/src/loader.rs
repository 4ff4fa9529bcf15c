use std::collections::BTreeMap;
use std::io::Read;

use afford_core::{
    BracketTableError, FilingStatus, ReferenceData, StateTaxSpec, TaxBracket, TaxBracketTable,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Jurisdiction code for federal rows.
pub const FEDERAL_JURISDICTION: &str = "FED";

/// Errors that can occur when loading bracket rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row has an empty jurisdiction")]
    EmptyJurisdiction,

    #[error("unknown filing status '{filing_status}' for {jurisdiction}")]
    UnknownFilingStatus {
        jurisdiction: String,
        filing_status: String,
    },

    #[error("invalid {jurisdiction} brackets for {filing_status}: {source}")]
    InvalidTable {
        jurisdiction: String,
        filing_status: FilingStatus,
        #[source]
        source: BracketTableError,
    },
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single row from a bracket CSV file.
///
/// - `jurisdiction`: `FED` for the federal schedule, otherwise a state code
/// - `filing_status`: `single`, `married_joint` or `head_of_household`
/// - `lower_bound`: income at which the bracket starts
/// - `rate`: the marginal rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BracketRecord {
    pub jurisdiction: String,
    pub filing_status: String,
    pub lower_bound: Decimal,
    pub rate: Decimal,
}

/// Loader for bracket tables from CSV files.
///
/// Rows are grouped by jurisdiction and filing status. Each group replaces
/// the matching federal table, or becomes the progressive table for that
/// state and status.
pub struct BracketTableLoader;

impl BracketTableLoader {
    /// Parse bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validates the records and applies them onto `reference`.
    ///
    /// Every group is validated before anything is applied, so a bad row
    /// leaves `reference` untouched. A state that was previously no-tax or
    /// flat becomes progressive. Returns the number of tables applied.
    pub fn apply(
        reference: &mut ReferenceData,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let tables = Self::group(records)?;
        let applied = tables.len();

        for ((jurisdiction, filing_status), table) in tables {
            if jurisdiction == FEDERAL_JURISDICTION {
                *reference.federal_brackets.get_mut(filing_status) = table;
                continue;
            }

            if let Some(StateTaxSpec::Progressive(existing)) =
                reference.states.get_mut(&jurisdiction)
            {
                existing.insert(filing_status, table);
                continue;
            }

            if let Some(spec) = reference.states.get(&jurisdiction) {
                warn!(
                    state = %jurisdiction,
                    mode = spec.mode().as_str(),
                    "replacing state tax mode with progressive brackets"
                );
            }
            reference.states.insert(
                jurisdiction,
                StateTaxSpec::Progressive(BTreeMap::from([(filing_status, table)])),
            );
        }

        debug!(applied, "applied bracket tables");
        Ok(applied)
    }

    fn group(
        records: &[BracketRecord],
    ) -> Result<BTreeMap<(String, FilingStatus), TaxBracketTable>, BracketLoaderError> {
        let mut groups: BTreeMap<(String, FilingStatus), Vec<TaxBracket>> = BTreeMap::new();

        for record in records {
            let jurisdiction = record.jurisdiction.trim().to_ascii_uppercase();
            if jurisdiction.is_empty() {
                return Err(BracketLoaderError::EmptyJurisdiction);
            }
            let filing_status = FilingStatus::parse(record.filing_status.trim()).ok_or_else(|| {
                BracketLoaderError::UnknownFilingStatus {
                    jurisdiction: jurisdiction.clone(),
                    filing_status: record.filing_status.clone(),
                }
            })?;

            groups
                .entry((jurisdiction, filing_status))
                .or_default()
                .push(TaxBracket::new(record.lower_bound, record.rate));
        }

        groups
            .into_iter()
            .map(|((jurisdiction, filing_status), mut brackets)| {
                brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
                match TaxBracketTable::new(brackets) {
                    Ok(table) => Ok(((jurisdiction, filing_status), table)),
                    Err(source) => Err(BracketLoaderError::InvalidTable {
                        jurisdiction,
                        filing_status,
                        source,
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"jurisdiction,filing_status,lower_bound,rate
FED,single,0,0.10
FED,single,11925,0.12
FED,single,48475,0.22
ny,single,0,0.04
NY,single,8500,0.045
NY,married_joint,0,0.04
NY,married_joint,17150,0.045
"#;

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_reads_all_rows() {
        let records = BracketTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 7);
        assert_eq!(
            records[1],
            BracketRecord {
                jurisdiction: "FED".to_string(),
                filing_status: "single".to_string(),
                lower_bound: dec!(11925),
                rate: dec!(0.12),
            }
        );
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "jurisdiction,filing_status,lower_bound\nFED,single,0";

        let result = BracketTableLoader::parse(csv.as_bytes());

        let err = result.expect_err("Should fail for missing column");
        let BracketLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_invalid_csv_bad_decimal() {
        let csv = "jurisdiction,filing_status,lower_bound,rate\nFED,single,abc,0.10";

        let result = BracketTableLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(BracketLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv = "jurisdiction,filing_status,lower_bound,rate\n";

        let records = BracketTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // apply tests
    // =========================================================================

    #[test]
    fn test_apply_replaces_federal_and_installs_states() {
        let records = BracketTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
        let mut reference = ReferenceData::builtin();

        let applied = BracketTableLoader::apply(&mut reference, &records).expect("Failed to apply");

        assert_eq!(applied, 3);
        assert_eq!(reference.federal_table(FilingStatus::Single).len(), 3);
        assert_eq!(
            reference.federal_table(FilingStatus::Single).brackets()[1],
            TaxBracket::new(dec!(11925), dec!(0.12))
        );
        // untouched statuses keep the built-in schedule
        assert_eq!(reference.federal_table(FilingStatus::MarriedJoint).len(), 7);

        let StateTaxSpec::Progressive(tables) = reference.state_spec("NY").unwrap() else {
            panic!("NY should be progressive");
        };
        assert_eq!(tables.len(), 2);
        assert!(!tables.contains_key(&FilingStatus::HeadOfHousehold));
    }

    #[test]
    fn test_apply_sorts_rows_by_lower_bound() {
        let csv = r#"jurisdiction,filing_status,lower_bound,rate
CA,single,10412,0.02
CA,single,0,0.01"#;
        let records = BracketTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
        let mut reference = ReferenceData::builtin();

        BracketTableLoader::apply(&mut reference, &records).expect("Failed to apply");

        let StateTaxSpec::Progressive(tables) = reference.state_spec("CA").unwrap() else {
            panic!("CA should be progressive");
        };
        assert_eq!(
            tables[&FilingStatus::Single].brackets()[0],
            TaxBracket::new(dec!(0), dec!(0.01))
        );
    }

    #[test]
    fn test_apply_converts_flat_state_to_progressive() {
        let csv = r#"jurisdiction,filing_status,lower_bound,rate
CO,single,0,0.03
CO,single,50000,0.05"#;
        let records = BracketTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
        let mut reference = ReferenceData::builtin();

        BracketTableLoader::apply(&mut reference, &records).expect("Failed to apply");

        assert!(matches!(
            reference.state_spec("CO"),
            Ok(StateTaxSpec::Progressive(_))
        ));
    }

    #[test]
    fn test_apply_rejects_unknown_filing_status() {
        let csv = "jurisdiction,filing_status,lower_bound,rate\nFED,married_separate,0,0.10";
        let records = BracketTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
        let mut reference = ReferenceData::builtin();

        let result = BracketTableLoader::apply(&mut reference, &records);

        assert_eq!(
            result,
            Err(BracketLoaderError::UnknownFilingStatus {
                jurisdiction: "FED".to_string(),
                filing_status: "married_separate".to_string(),
            })
        );
    }

    #[test]
    fn test_apply_rejects_invalid_table_without_partial_update() {
        let csv = r#"jurisdiction,filing_status,lower_bound,rate
FED,single,0,0.50
NY,single,100,0.04"#;
        let records = BracketTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
        let mut reference = ReferenceData::builtin();

        let result = BracketTableLoader::apply(&mut reference, &records);

        assert_eq!(
            result,
            Err(BracketLoaderError::InvalidTable {
                jurisdiction: "NY".to_string(),
                filing_status: FilingStatus::Single,
                source: BracketTableError::FirstLowerBoundNotZero(dec!(100)),
            })
        );
        assert_eq!(reference, ReferenceData::builtin());
    }

    #[test]
    fn test_apply_rejects_empty_jurisdiction() {
        let records = vec![BracketRecord {
            jurisdiction: " ".to_string(),
            filing_status: "single".to_string(),
            lower_bound: dec!(0),
            rate: dec!(0.10),
        }];
        let mut reference = ReferenceData::builtin();

        assert_eq!(
            BracketTableLoader::apply(&mut reference, &records),
            Err(BracketLoaderError::EmptyJurisdiction)
        );
    }
}
