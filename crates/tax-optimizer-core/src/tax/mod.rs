pub mod amt;
pub mod brackets;
pub mod credits;
pub mod niit;
pub mod phase_out;
pub mod pipeline;
pub mod qbi;
pub mod self_employment;
pub mod stacked;

pub use amt::{alternative_minimum_tax, AmtInput, AmtParams, AmtResult};
pub use brackets::{bracket_tax, Bracket, BracketTable};
pub use niit::net_investment_income_tax;
pub use phase_out::{phase_out_by_rate, phase_out_fraction};
pub use pipeline::{calculate_tax, TaxPipeline, TaxResult};
pub use qbi::{qbi_deduction, QbiBusiness, QbiResult};
pub use self_employment::{self_employment_tax, SelfEmploymentTax};
pub use stacked::stacked_income_tax;
