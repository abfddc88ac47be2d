//! PostgreSQL loan ledger

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LoanFilter, LoanLedger, Page};
use crate::error::{LoanError, LoanResult};
use crate::loan::{Client, Installment, Loan, LoanOfficer, LoanRecord, LoanStatus, Payment};

const LOAN_COLUMNS: &str = "id, loan_number, client_id, officer_id, applied_amount, \
     approved_amount, disbursed_amount, application_date, disbursement_date, maturity_date, \
     status, created_at";

/// Raw `loans` row, status still untyped
#[derive(Debug, sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    loan_number: String,
    client_id: Uuid,
    officer_id: Uuid,
    applied_amount: Option<Decimal>,
    approved_amount: Option<Decimal>,
    disbursed_amount: Option<Decimal>,
    application_date: NaiveDate,
    disbursement_date: Option<NaiveDate>,
    maturity_date: Option<NaiveDate>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LoanRow> for Loan {
    type Error = LoanError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<LoanStatus>().map_err(|_| {
            LoanError::integrity(
                &row.loan_number,
                format!("unrecognised status '{}' in store", row.status),
            )
        })?;

        Ok(Loan {
            id: row.id,
            loan_number: row.loan_number,
            client_id: row.client_id,
            officer_id: row.officer_id,
            applied_amount: row.applied_amount,
            approved_amount: row.approved_amount,
            disbursed_amount: row.disbursed_amount,
            application_date: row.application_date,
            disbursement_date: row.disbursement_date,
            maturity_date: row.maturity_date,
            status,
            created_at: row.created_at,
        })
    }
}

/// Raw `staff_users` row
#[derive(Debug, sqlx::FromRow)]
struct OfficerRow {
    id: Uuid,
    name: String,
    role: String,
}

impl TryFrom<OfficerRow> for LoanOfficer {
    type Error = LoanError;

    fn try_from(row: OfficerRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|_| {
            LoanError::Storage(format!(
                "staff user {} has unrecognised role '{}'",
                row.id, row.role
            ))
        })?;
        Ok(LoanOfficer {
            id: row.id,
            name: row.name,
            role,
        })
    }
}

/// Ledger reading from PostgreSQL
#[derive(Clone)]
pub struct PgLedger {
    db_pool: PgPool,
}

impl PgLedger {
    /// Create a new ledger over an existing pool
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Load schedules and payments for a batch of loans
    async fn hydrate(&self, rows: Vec<LoanRow>) -> LoanResult<Vec<LoanRecord>> {
        let loans = rows
            .into_iter()
            .map(Loan::try_from)
            .collect::<LoanResult<Vec<Loan>>>()?;
        if loans.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = loans.iter().map(|l| l.id).collect();

        let installments = sqlx::query_as::<_, Installment>(
            r#"
            SELECT id, loan_id, due_date, amount_due
            FROM installments
            WHERE loan_id = ANY($1)
            ORDER BY due_date ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, loan_id, amount, received_on, installment_id
            FROM payments
            WHERE loan_id = ANY($1)
            ORDER BY received_on ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let mut schedule: HashMap<Uuid, Vec<Installment>> = HashMap::new();
        for installment in installments {
            schedule.entry(installment.loan_id).or_default().push(installment);
        }
        let mut receipts: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for payment in payments {
            receipts.entry(payment.loan_id).or_default().push(payment);
        }

        Ok(loans
            .into_iter()
            .map(|loan| {
                let installments = schedule.remove(&loan.id).unwrap_or_default();
                let payments = receipts.remove(&loan.id).unwrap_or_default();
                LoanRecord::new(loan, installments, payments)
            })
            .collect())
    }
}

impl LoanLedger for PgLedger {
    async fn find_officer(&self, officer_id: Uuid) -> LoanResult<Option<LoanOfficer>> {
        let row = sqlx::query_as::<_, OfficerRow>(
            "SELECT id, name, role FROM staff_users WHERE id = $1",
        )
        .bind(officer_id)
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(LoanOfficer::try_from).transpose()
    }

    async fn list_officers(&self) -> LoanResult<Vec<LoanOfficer>> {
        let rows = sqlx::query_as::<_, OfficerRow>(
            "SELECT id, name, role FROM staff_users WHERE role = 'loan_officer' ORDER BY name ASC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter().map(LoanOfficer::try_from).collect()
    }

    async fn find_loan(&self, loan_number: &str) -> LoanResult<Option<LoanRecord>> {
        let row = sqlx::query_as::<_, LoanRow>(&format!(
            "SELECT {} FROM loans WHERE loan_number = $1",
            LOAN_COLUMNS
        ))
        .bind(loan_number)
        .fetch_optional(&self.db_pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn fetch_loans(
        &self,
        filter: &LoanFilter,
        page: Option<Page>,
    ) -> LoanResult<Vec<LoanRecord>> {
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new(format!("SELECT {} FROM loans WHERE 1=1", LOAN_COLUMNS));

        if let Some(officer_id) = filter.officer_id {
            query_builder.push(" AND officer_id = ");
            query_builder.push_bind(officer_id);
        }
        if let Some(from) = filter.window.from {
            query_builder.push(" AND application_date >= ");
            query_builder.push_bind(from);
        }
        if let Some(to) = filter.window.to {
            query_builder.push(" AND application_date <= ");
            query_builder.push_bind(to);
        }

        query_builder.push(" ORDER BY created_at DESC, loan_number ASC");

        if let Some(page) = page {
            query_builder.push(" LIMIT ");
            query_builder.push_bind(i64::from(page.limit));
            query_builder.push(" OFFSET ");
            query_builder.push_bind(i64::from(page.offset));
        }

        let rows = query_builder
            .build_query_as::<LoanRow>()
            .fetch_all(&self.db_pool)
            .await?;

        tracing::debug!(
            officer_id = ?filter.officer_id,
            count = rows.len(),
            "Fetched loans from ledger"
        );

        self.hydrate(rows).await
    }

    async fn fetch_clients(&self, ids: &[Uuid]) -> LoanResult<Vec<Client>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, client_number, name, created_at
            FROM clients
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(clients)
    }
}
