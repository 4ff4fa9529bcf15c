use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bracket table is rejected at construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table is empty")]
    Empty,

    #[error("first bracket must start at 0, got {0}")]
    FirstLowerBoundNotZero(Decimal),

    #[error("lower bounds must strictly increase: {previous} is followed by {next}")]
    LowerBoundsNotIncreasing { previous: Decimal, next: Decimal },

    #[error("rate must be between 0 and 1, got {0}")]
    RateOutOfRange(Decimal),

    #[error("rates must not decrease: {previous} is followed by {next}")]
    RatesNotProgressive { previous: Decimal, next: Decimal },
}

/// A marginal bracket: income from `lower_bound` up to the next bracket's
/// lower bound is taxed at `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        lower_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self { lower_bound, rate }
    }
}

/// An ordered, validated sequence of marginal brackets.
///
/// The first bracket starts at zero, lower bounds strictly increase and
/// rates never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct TaxBracketTable {
    brackets: Vec<TaxBracket>,
}

impl TaxBracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, BracketTableError> {
        let first = brackets.first().ok_or(BracketTableError::Empty)?;
        if !first.lower_bound.is_zero() {
            return Err(BracketTableError::FirstLowerBoundNotZero(first.lower_bound));
        }

        for bracket in &brackets {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(BracketTableError::RateOutOfRange(bracket.rate));
            }
        }

        for pair in brackets.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next.lower_bound <= previous.lower_bound {
                return Err(BracketTableError::LowerBoundsNotIncreasing {
                    previous: previous.lower_bound,
                    next: next.lower_bound,
                });
            }
            if next.rate < previous.rate {
                return Err(BracketTableError::RatesNotProgressive {
                    previous: previous.rate,
                    next: next.rate,
                });
            }
        }

        Ok(Self { brackets })
    }

    /// Builds a table from `(lower_bound, rate)` pairs, the shape used by the
    /// reference feed.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, BracketTableError>
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(lower_bound, rate)| TaxBracket::new(lower_bound, rate))
                .collect(),
        )
    }

    /// Builds a table that is known to be valid, such as the built-in
    /// reference data.
    pub(crate) fn new_unchecked(brackets: Vec<TaxBracket>) -> Self {
        Self { brackets }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Iterates brackets with the lower bound of the following bracket, or
    /// `None` for the open-ended top bracket.
    pub fn ranges(&self) -> impl Iterator<Item = (TaxBracket, Option<Decimal>)> + '_ {
        self.brackets.iter().enumerate().map(|(i, bracket)| {
            let upper = self.brackets.get(i + 1).map(|next| next.lower_bound);
            (*bracket, upper)
        })
    }
}

impl TryFrom<Vec<TaxBracket>> for TaxBracketTable {
    type Error = BracketTableError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<TaxBracketTable> for Vec<TaxBracket> {
    fn from(table: TaxBracketTable) -> Self {
        table.brackets
    }
}
