//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::ledger::LoanLedger;
use crate::loan_service::LoanService;

/// Shared application state
pub struct AppState<L> {
    pub loan_service: Arc<LoanService<L>>,
}

impl<L: LoanLedger> AppState<L> {
    pub fn new(loan_service: Arc<LoanService<L>>) -> Self {
        Self { loan_service }
    }
}

// Manual impl: the ledger itself does not need to be `Clone`.
impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            loan_service: self.loan_service.clone(),
        }
    }
}

impl<L> FromRef<AppState<L>> for Arc<LoanService<L>> {
    fn from_ref(app_state: &AppState<L>) -> Self {
        app_state.loan_service.clone()
    }
}
