//! Route definitions for the loanbook API

mod loan_officer;
mod portfolio;

pub use loan_officer::loan_officer_routes;
pub use portfolio::portfolio_routes;

use axum::Router;

use crate::ledger::LoanLedger;
use crate::middleware;
use crate::state::AppState;

/// Every loan route with tracing and security headers applied
pub fn api_router<L: LoanLedger>(state: AppState<L>) -> Router {
    Router::new()
        .merge(loan_officer_routes())
        .merge(portfolio_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
