mod budget;
mod filing_status;
mod loan;
mod reference_data;
mod state_tax;
mod tax_bracket;

pub use budget::{BudgetCategory, BudgetProfile, BudgetProfileError, CategoryWeight};
pub use filing_status::{ByFilingStatus, FilingStatus};
pub use loan::{DtiPreset, DtiRatios, IncomeBasis, LoanTerms};
pub use reference_data::ReferenceData;
pub use state_tax::{StateSelection, StateTaxDetails, StateTaxMode, StateTaxSpec};
pub use tax_bracket::{BracketTableError, TaxBracket, TaxBracketTable};
