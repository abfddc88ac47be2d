//! Loan domain module
//!
//! Contains the ledger models, the delinquency classifier and the
//! statistics aggregator.

pub mod classifier;
mod model;
pub mod stats;

pub use classifier::{
    classify, classify_loan, classify_with_schedule, ClassifiedLoan, Classification,
    DelinquencyPolicy, InstallmentStanding, DEFAULT_ARREARS_THRESHOLD_DAYS,
};
pub use model::*;
pub use stats::{aggregate, LoanStats};
