//! Loan officer route definitions

use axum::{routing::get, Router};

use crate::handlers::{get_assigned_borrowers, get_assigned_loans, get_officer_stats};
use crate::ledger::LoanLedger;
use crate::state::AppState;

pub fn loan_officer_routes<L: LoanLedger>() -> Router<AppState<L>> {
    Router::new()
        .route("/loan-officer/stats", get(get_officer_stats::<L>))
        .route("/loan-officer/stats/:officer_id", get(get_officer_stats::<L>))
        .route("/loan-officer/loans", get(get_assigned_loans::<L>))
        .route("/loan-officer/loans/:officer_id", get(get_assigned_loans::<L>))
        .route("/loan-officer/borrowers", get(get_assigned_borrowers::<L>))
        .route(
            "/loan-officer/borrowers/:officer_id",
            get(get_assigned_borrowers::<L>),
        )
}
