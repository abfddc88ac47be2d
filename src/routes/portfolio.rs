//! Portfolio and loan detail route definitions

use axum::{routing::get, Router};

use crate::handlers::{
    get_loan_detail, get_loans_by_status, get_officer_breakdown, get_portfolio_stats,
};
use crate::ledger::LoanLedger;
use crate::state::AppState;

pub fn portfolio_routes<L: LoanLedger>() -> Router<AppState<L>> {
    Router::new()
        .route("/portfolio/stats", get(get_portfolio_stats::<L>))
        .route("/portfolio/officers", get(get_officer_breakdown::<L>))
        .route("/portfolio/loans/:status", get(get_loans_by_status::<L>))
        .route("/loans/:loan_number", get(get_loan_detail::<L>))
}
