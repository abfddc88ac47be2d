//! Portfolio and loan detail handlers (admin and supervisor dashboards)

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};

use super::{parse_officer_id, query_params, reporting_context};
use crate::error::{ApiError, ApiResult};
use crate::ledger::{DateWindow, LoanLedger};
use crate::loan::{ClassifiedLoan, LoanStats, LoanStatus};
use crate::loan_service::{LoanService, OfficerStats};
use crate::middleware::CallerIdentity;
use crate::models::{ApiResponse, ClassificationParams, StatusListParams, WindowParams};

/// GET /portfolio/stats - Rollup of the whole book
pub async fn get_portfolio_stats<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    query: Result<Query<WindowParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<LoanStats>>> {
    caller.require_portfolio_access()?;
    let params = query_params(query)?;
    let window = DateWindow::parse(params.from.as_deref(), params.to.as_deref())?;
    let ctx = reporting_context(&service, &params.classification())?;

    let stats = service.portfolio_stats(window, &ctx).await?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /portfolio/officers - One rollup per loan officer
pub async fn get_officer_breakdown<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    query: Result<Query<WindowParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<OfficerStats>>>> {
    caller.require_portfolio_access()?;
    let params = query_params(query)?;
    let window = DateWindow::parse(params.from.as_deref(), params.to.as_deref())?;
    let ctx = reporting_context(&service, &params.classification())?;

    let breakdown = service.officer_breakdown(window, &ctx).await?;

    Ok(Json(ApiResponse::ok(breakdown)))
}

/// GET /portfolio/loans/:status - Arrears, missed repayment and similar views
pub async fn get_loans_by_status<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    Path(status): Path<String>,
    query: Result<Query<StatusListParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<ClassifiedLoan>>>> {
    let params = query_params(query)?;
    let status = status.parse::<LoanStatus>()?;
    let requested = params
        .officer_id
        .as_deref()
        .map(parse_officer_id)
        .transpose()?;

    // Loan officers get the status view of their own book only
    let officer_id = if caller.role.can_view_portfolio() {
        requested
    } else {
        Some(caller.officer_scope(requested)?)
    };
    let ctx = reporting_context(&service, &params.classification())?;

    let loans = service
        .loans_by_status(status, officer_id, params.limit, params.offset, &ctx)
        .await?;

    Ok(Json(ApiResponse::ok(loans)))
}

/// GET /loans/:loan_number - One loan with its schedule standing
pub async fn get_loan_detail<L: LoanLedger>(
    State(service): State<Arc<LoanService<L>>>,
    caller: CallerIdentity,
    Path(loan_number): Path<String>,
    query: Result<Query<ClassificationParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<ClassifiedLoan>>> {
    let params = query_params(query)?;
    let ctx = reporting_context(&service, &params)?;

    let loan = service.loan_detail(&loan_number, &ctx).await?;

    if !caller.can_read_loan_of(loan.loan.officer_id) {
        return Err(ApiError::Forbidden(
            "Loan is assigned to another officer".to_string(),
        ));
    }

    Ok(Json(ApiResponse::ok(loan)))
}
