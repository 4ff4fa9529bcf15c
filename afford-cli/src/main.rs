use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use afford_core::{
    AffordabilityRequest, DtiPreset, DtiRatios, FilingStatus, HouseholdRequest, IncomeBasis,
    LoanTerms, ReferenceData, StateSelection, compute_affordability, compute_budget, compute_tax,
    explain_federal, explain_state, plan_household,
};
use afford_data::{BracketTableLoader, StateTaxFeed};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AffordConfig, LoanDefaults};
use crate::report::{AffordabilityReport, BreakdownReport, BudgetReport, PlanReport, TaxReport};

mod config;
mod logging;
mod report;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Household affordability calculator.
///
/// Estimates income tax and take-home pay, splits take-home into a monthly
/// budget, and finds the largest mortgage the household can carry under both
/// lender debt-to-income limits and its own budget surplus.
#[derive(Debug, Parser)]
#[command(name = "afford", version, about)]
struct Cli {
    /// JSON reference feed with federal and state tax tables.
    /// Without it the built-in 2024 tables are used.
    #[arg(long, global = true)]
    feed: Option<PathBuf>,

    /// CSV of bracket rows (jurisdiction,filing_status,lower_bound,rate)
    /// applied on top of the reference tables.
    #[arg(long, global = true)]
    brackets: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log level or filter directive (overrides RUST_LOG and the config file).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Federal and state income tax, and monthly take-home pay.
    Tax(TaxArgs),
    /// Split monthly take-home pay across budget categories.
    Budget(BudgetArgs),
    /// Largest mortgage under the DTI and budget-surplus caps.
    Afford(AffordArgs),
    /// Bracket-by-bracket explanation of federal and state tax.
    Breakdown(TaxArgs),
    /// Tax, budget, mortgage and cash flow in one pass.
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
struct StateArgs {
    /// State code (e.g. TX, CA).
    #[arg(long, conflicts_with = "state_rate")]
    state: Option<String>,

    /// Flat state rate applied to gross income when no state is given.
    #[arg(long)]
    state_rate: Option<Decimal>,
}

impl StateArgs {
    fn selection(&self) -> StateSelection {
        match (&self.state, self.state_rate) {
            (Some(code), _) => StateSelection::Code(code.clone()),
            (None, Some(rate)) => StateSelection::ManualRate(rate),
            (None, None) => StateSelection::ManualRate(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Args)]
struct TaxArgs {
    /// Gross annual income.
    #[arg(long)]
    income: Decimal,

    /// single, married_joint or head_of_household.
    #[arg(long, default_value = "single")]
    status: FilingStatus,

    #[command(flatten)]
    state: StateArgs,
}

#[derive(Debug, Args)]
struct HouseholdArgs {
    #[arg(long, default_value_t = 1)]
    adults: u32,

    #[arg(long, default_value_t = 0)]
    kids: u32,
}

#[derive(Debug, Args)]
struct BudgetArgs {
    /// Monthly take-home pay. May be negative.
    #[arg(long, allow_negative_numbers = true)]
    takehome: Decimal,

    #[command(flatten)]
    household: HouseholdArgs,
}

#[derive(Debug, Args)]
struct LoanArgs {
    /// Other monthly debt payments.
    #[arg(long, default_value = "0")]
    debt: Decimal,

    /// Annual interest rate as a decimal (0.065 for 6.5%).
    #[arg(long)]
    rate: Option<Decimal>,

    /// Loan term in years.
    #[arg(long)]
    term: Option<u32>,

    /// Monthly property taxes plus insurance.
    #[arg(long)]
    taxes_insurance: Option<Decimal>,

    /// conventional, fha or va.
    #[arg(long)]
    preset: Option<DtiPreset>,

    /// Front-end DTI ratio; overrides the preset.
    #[arg(long)]
    front_end: Option<Decimal>,

    /// Back-end DTI ratio; overrides the preset.
    #[arg(long)]
    back_end: Option<Decimal>,
}

struct ResolvedLoan {
    terms: LoanTerms,
    ratios: DtiRatios,
    taxes_insurance_monthly: Decimal,
}

impl LoanArgs {
    fn resolve(
        &self,
        defaults: &LoanDefaults,
    ) -> Result<ResolvedLoan> {
        let terms = LoanTerms::new(
            self.rate.unwrap_or(defaults.rate_annual),
            self.term.unwrap_or(defaults.term_years),
        )
        .context("Invalid loan terms")?;

        let preset = self.preset.unwrap_or(defaults.preset).ratios();
        let ratios = DtiRatios::new(
            self.front_end.unwrap_or(preset.front_end),
            self.back_end.unwrap_or(preset.back_end),
        )
        .context("Invalid DTI ratios")?;

        Ok(ResolvedLoan {
            terms,
            ratios,
            taxes_insurance_monthly: self
                .taxes_insurance
                .unwrap_or(defaults.taxes_insurance_monthly),
        })
    }
}

#[derive(Debug, Args)]
struct AffordArgs {
    /// Gross annual income.
    #[arg(long)]
    income: Decimal,

    /// Monthly take-home pay; when given, DTI ratios apply to it instead of
    /// gross income.
    #[arg(long, allow_negative_numbers = true)]
    takehome: Option<Decimal>,

    /// Monthly cash left after the household budget.
    #[arg(long, allow_negative_numbers = true)]
    surplus: Decimal,

    #[command(flatten)]
    loan: LoanArgs,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    tax: TaxArgs,

    #[command(flatten)]
    household: HouseholdArgs,

    #[command(flatten)]
    loan: LoanArgs,

    /// Apply DTI ratios to take-home pay instead of gross income.
    #[arg(long, default_value_t = false)]
    use_takehome: bool,
}

// ─── reference data ──────────────────────────────────────────────────────────

fn load_reference(
    feed: Option<&Path>,
    brackets: Option<&Path>,
) -> Result<ReferenceData> {
    let mut reference = match feed {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open feed: {}", path.display()))?;
            let reference = StateTaxFeed::parse(BufReader::new(file))
                .with_context(|| format!("Failed to parse feed: {}", path.display()))?
                .into_reference_data()
                .with_context(|| format!("Invalid reference feed: {}", path.display()))?;
            info!(feed = %path.display(), states = reference.states.len(), "loaded reference feed");
            reference
        }
        None => {
            warn!("no reference feed given; using built-in 2024 tables");
            ReferenceData::builtin()
        }
    };

    if let Some(path) = brackets {
        let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = BracketTableLoader::parse(BufReader::new(file))
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let applied = BracketTableLoader::apply(&mut reference, &records)
            .with_context(|| format!("Invalid bracket tables in: {}", path.display()))?;
        info!(file = %path.display(), records = records.len(), applied, "applied bracket tables");
    }

    Ok(reference)
}

// ─── output ──────────────────────────────────────────────────────────────────

fn emit<T, D>(
    json: bool,
    value: &T,
    text: D,
) -> Result<()>
where
    T: Serialize,
    D: std::fmt::Display,
{
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialize result")?
        );
    } else {
        print!("{text}");
    }
    Ok(())
}

// ─── commands ────────────────────────────────────────────────────────────────

fn run(
    cli: Cli,
    config: AffordConfig,
) -> Result<()> {
    match cli.command {
        Command::Tax(args) => {
            let reference = load_reference(cli.feed.as_deref(), cli.brackets.as_deref())?;
            let result = compute_tax(
                &reference,
                args.income,
                args.status,
                &args.state.selection(),
            )?;
            emit(cli.json, &result, TaxReport(&result))
        }
        Command::Budget(args) => {
            let profile = config.budget_profile()?;
            let budget = compute_budget(
                args.takehome,
                args.household.adults,
                args.household.kids,
                &profile,
            );
            emit(cli.json, &budget, BudgetReport(&budget))
        }
        Command::Afford(args) => {
            let loan = args.loan.resolve(&config.loan)?;
            let request = AffordabilityRequest {
                annual_income: args.income,
                other_monthly_debt: args.loan.debt,
                loan: loan.terms,
                taxes_insurance_monthly: loan.taxes_insurance_monthly,
                ratios: loan.ratios,
                income_basis: args
                    .takehome
                    .map_or(IncomeBasis::Gross, IncomeBasis::TakeHome),
                surplus_limit: args.surplus,
            };
            let result = compute_affordability(&request)?;
            emit(cli.json, &result, AffordabilityReport(&result))
        }
        Command::Breakdown(args) => {
            let reference = load_reference(cli.feed.as_deref(), cli.brackets.as_deref())?;
            let federal = explain_federal(&reference, args.income, args.status)?;
            let state = explain_state(
                &reference,
                args.income,
                args.status,
                &args.state.selection(),
            )?;
            let report = BreakdownReport {
                federal: &federal,
                state: &state,
            };
            emit(
                cli.json,
                &serde_json::json!({ "federal": &federal, "state": &state }),
                report,
            )
        }
        Command::Plan(args) => {
            let reference = load_reference(cli.feed.as_deref(), cli.brackets.as_deref())?;
            let profile = config.budget_profile()?;
            let loan = args.loan.resolve(&config.loan)?;
            let request = HouseholdRequest {
                gross_income: args.tax.income,
                filing_status: args.tax.status,
                state: args.tax.state.selection(),
                adults: args.household.adults,
                kids: args.household.kids,
                other_monthly_debt: args.loan.debt,
                loan: loan.terms,
                taxes_insurance_monthly: loan.taxes_insurance_monthly,
                ratios: loan.ratios,
                use_takehome: args.use_takehome,
            };
            let plan = plan_household(&reference, &profile, &request)?;
            emit(cli.json, &plan, PlanReport(&plan))
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AffordConfig::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().or(config.logging.level.as_deref());
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    logging::init(level, log_file)?;

    debug!(command = ?cli.command, "starting");
    run(cli, config)
}
