//! Loan officer dashboard handlers
//!
//! Each route works with or without an explicit officer id; without one the
//! caller's own book is used.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};

use super::{parse_officer_id, query_params, reporting_context};
use crate::error::ApiResult;
use crate::ledger::LoanLedger;
use crate::loan::{ClassifiedLoan, LoanStats};
use crate::loan_service::{BorrowerSummary, LoanService};
use crate::middleware::CallerIdentity;
use crate::models::{ApiResponse, ClassificationParams, ListParams};

/// GET /loan-officer/stats[/:officer_id] - Rollup of an officer's loans
pub async fn get_officer_stats<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    officer: Option<Path<String>>,
    query: Result<Query<ClassificationParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<LoanStats>>> {
    let params = query_params(query)?;
    let requested = officer.map(|Path(raw)| parse_officer_id(&raw)).transpose()?;
    let officer_id = caller.officer_scope(requested)?;
    let ctx = reporting_context(&service, &params)?;

    let stats = service.stats_for_officer(officer_id, &ctx).await?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /loan-officer/loans[/:officer_id] - Officer's loans, newest first
pub async fn get_assigned_loans<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    officer: Option<Path<String>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<ClassifiedLoan>>>> {
    let params = query_params(query)?;
    let requested = officer.map(|Path(raw)| parse_officer_id(&raw)).transpose()?;
    let officer_id = caller.officer_scope(requested)?;
    let ctx = reporting_context(&service, &params.classification())?;

    let loans = service
        .assigned_loans(officer_id, params.limit, params.offset, &ctx)
        .await?;

    Ok(Json(ApiResponse::ok(loans)))
}

/// GET /loan-officer/borrowers[/:officer_id] - Officer's borrowers, newest first
pub async fn get_assigned_borrowers<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    officer: Option<Path<String>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<BorrowerSummary>>>> {
    let params = query_params(query)?;
    let requested = officer.map(|Path(raw)| parse_officer_id(&raw)).transpose()?;
    let officer_id = caller.officer_scope(requested)?;

    let borrowers = service.assigned_borrowers(officer_id, params.limit).await?;

    Ok(Json(ApiResponse::ok(borrowers)))
}
