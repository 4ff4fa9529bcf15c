//! Optional TOML configuration.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! file = "afford.log"
//!
//! [loan]
//! rate_annual = 0.065
//! term_years = 30
//! taxes_insurance_monthly = 350
//! preset = "fha"
//!
//! [budget.food]
//! base_share = 0.12
//! adult_weight = 0.5
//! kid_weight = 0.3
//! ```
//!
//! Every section is optional. Command-line flags win over these values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use afford_core::{BudgetCategory, BudgetProfile, CategoryWeight, DtiPreset, LoanTerms};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AffordConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub loan: LoanDefaults,
    /// Per-category overrides on top of the default budget weights.
    #[serde(default)]
    pub budget: BTreeMap<BudgetCategory, CategoryWeight>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Bare level or any `EnvFilter` directive.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoanDefaults {
    #[serde(default = "default_rate_annual")]
    pub rate_annual: Decimal,
    #[serde(default = "default_term_years")]
    pub term_years: u32,
    #[serde(default)]
    pub taxes_insurance_monthly: Decimal,
    #[serde(default = "default_preset")]
    pub preset: DtiPreset,
}

fn default_rate_annual() -> Decimal {
    Decimal::new(65, 3)
}

fn default_term_years() -> u32 {
    30
}

fn default_preset() -> DtiPreset {
    DtiPreset::Conventional
}

impl Default for LoanDefaults {
    fn default() -> Self {
        Self {
            rate_annual: default_rate_annual(),
            term_years: default_term_years(),
            taxes_insurance_monthly: Decimal::ZERO,
            preset: default_preset(),
        }
    }
}

impl AffordConfig {
    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        LoanTerms::new(self.loan.rate_annual, self.loan.term_years)
            .context("Invalid [loan] section")?;
        if self.loan.taxes_insurance_monthly < Decimal::ZERO {
            anyhow::bail!(
                "Invalid [loan] section: taxes_insurance_monthly must be non-negative, got {}",
                self.loan.taxes_insurance_monthly
            );
        }
        self.budget_profile()?;
        Ok(())
    }

    /// The default budget weights with this file's overrides applied.
    pub fn budget_profile(&self) -> Result<BudgetProfile> {
        BudgetProfile::default()
            .with_overrides(self.budget.clone())
            .context("Invalid [budget] section")
    }
}
