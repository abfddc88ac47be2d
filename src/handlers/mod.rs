//! API handlers for the loanbook backend

pub mod loan_officer;
pub mod portfolio;

pub use loan_officer::*;
pub use portfolio::*;

use axum::extract::{rejection::QueryRejection, Query};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::ledger::{parse_date, LoanLedger};
use crate::loan_service::{LoanService, ReportingContext};
use crate::models::ClassificationParams;

/// Unwrap query parameters, reporting bad input in the API envelope
pub(crate) fn query_params<T: Validate>(
    query: Result<Query<T>, QueryRejection>,
) -> ApiResult<T> {
    let Query(params) = query.map_err(|e| ApiError::InvalidArgument(e.body_text()))?;
    params.validate()?;
    Ok(params)
}

/// Reference date and threshold for a request.
///
/// This is the only place the wall clock is read: the loan core always
/// receives its reference date explicitly.
pub(crate) fn reporting_context<L: LoanLedger>(
    service: &LoanService<L>,
    params: &ClassificationParams,
) -> ApiResult<ReportingContext> {
    let as_of = parse_date(params.as_of.as_deref())?.unwrap_or_else(|| Utc::now().date_naive());
    Ok(service.context(as_of, params.threshold))
}

pub(crate) fn parse_officer_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::InvalidArgument(format!("'{}' is not a valid officer id", raw)))
}
