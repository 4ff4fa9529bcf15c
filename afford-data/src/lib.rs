//! Loaders that turn reference files into [`afford_core::ReferenceData`].
//!
//! - [`StateTaxFeed`]: the JSON reference feed (federal schedules, standard
//!   deductions, and every state's tax mode).
//! - [`BracketTableLoader`]: a CSV of bracket rows layered on top of existing
//!   reference data.

mod feed;
mod loader;

pub use feed::{FeedError, StateTaxFeed};
pub use loader::{BracketLoaderError, BracketRecord, BracketTableLoader, FEDERAL_JURISDICTION};
