//! Integration tests loading reference files and running the calculators on
//! the result.

use afford_core::{
    CalculationError, ConfigurationGap, FilingStatus, ReferenceData, StateBreakdown, StateSelection,
    StateTaxSpec, compute_tax, explain_state,
};
use afford_data::{BracketTableLoader, StateTaxFeed};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const TEST_FEED: &str = include_str!("../test-data/state_tax.json");
const TEST_CSV: &str = include_str!("../test-data/brackets.csv");

fn feed_reference() -> ReferenceData {
    StateTaxFeed::parse(TEST_FEED.as_bytes())
        .expect("Failed to parse feed")
        .into_reference_data()
        .expect("Failed to build reference data")
}

#[test]
fn test_feed_loads_every_state_mode() {
    let reference = feed_reference();

    let codes: Vec<&str> = reference.state_codes().collect();
    assert_eq!(codes, vec!["AK", "CA", "CO", "FL", "IL", "NY", "TX", "WA"]);
    assert_eq!(
        reference.state_spec("il"),
        Ok(&StateTaxSpec::FlatRate(dec!(0.0495)))
    );
}

#[test]
fn test_feed_federal_matches_builtin() {
    let reference = feed_reference();
    let builtin = ReferenceData::builtin();

    for status in FilingStatus::ALL {
        assert_eq!(
            reference.federal_table(status),
            builtin.federal_table(status)
        );
        assert_eq!(
            reference.standard_deduction(status),
            builtin.standard_deduction(status)
        );
    }
}

#[test]
fn test_progressive_state_tax_from_feed() {
    let reference = feed_reference();

    let result = compute_tax(
        &reference,
        dec!(120000),
        FilingStatus::Single,
        &StateSelection::Code("NY".to_string()),
    )
    .expect("Failed to compute tax");

    assert_eq!(result.taxable_income, dec!(105400));
    assert_eq!(result.federal_tax, dec!(18338.50));
    assert_eq!(result.state_tax, dec!(5755.75));
    assert_eq!(result.monthly_takehome, dec!(7992.15));
}

#[test]
fn test_state_breakdown_from_feed_matches_tax() {
    let reference = feed_reference();
    let state = StateSelection::Code("CA".to_string());

    let breakdown = explain_state(&reference, dec!(250000), FilingStatus::MarriedJoint, &state)
        .expect("Failed to explain state tax");
    let result = compute_tax(&reference, dec!(250000), FilingStatus::MarriedJoint, &state)
        .expect("Failed to compute tax");

    let StateBreakdown::Progressive(ref tax_breakdown) = breakdown else {
        panic!("CA should explain as progressive, got {breakdown:?}");
    };
    assert_eq!(tax_breakdown.slices.len(), 6);
    assert_eq!(breakdown.total(), result.state_tax);
}

#[test]
fn test_missing_status_table_is_a_configuration_gap() {
    let reference = feed_reference();

    let result = compute_tax(
        &reference,
        dec!(80000),
        FilingStatus::HeadOfHousehold,
        &StateSelection::Code("CA".to_string()),
    );

    assert_eq!(
        result,
        Err(CalculationError::ConfigurationGap(
            ConfigurationGap::MissingBrackets {
                state: "CA".to_string(),
                filing_status: FilingStatus::HeadOfHousehold,
            }
        ))
    );
}

#[test]
fn test_csv_overlay_adds_state_and_replaces_federal() {
    let mut reference = feed_reference();
    let records = BracketTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

    let applied = BracketTableLoader::apply(&mut reference, &records).expect("Failed to apply");

    assert_eq!(applied, 2);
    let result = compute_tax(
        &reference,
        dec!(60000),
        FilingStatus::Single,
        &StateSelection::Code("or".to_string()),
    )
    .expect("Failed to compute tax");
    assert_eq!(result.taxable_income, dec!(45400));
    assert_eq!(result.federal_tax, dec!(5209.50));
    assert_eq!(result.state_tax, dec!(3671.50));
}

#[test]
fn test_unlisted_state_is_unknown() {
    let reference = feed_reference();

    let result = compute_tax(
        &reference,
        dec!(60000),
        FilingStatus::Single,
        &StateSelection::Code("OR".to_string()),
    );

    assert_eq!(
        result,
        Err(CalculationError::ConfigurationGap(
            ConfigurationGap::UnknownState("OR".to_string())
        ))
    );
}
