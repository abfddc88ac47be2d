//! Loan query service - the read-side entry point for loan officer and
//! portfolio dashboards
//!
//! Every operation reads through a [`LoanLedger`], classifies on read and
//! aggregates in memory. Nothing here writes to the store, and the reference
//! date always comes in from the caller.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{LoanError, LoanResult};
use crate::ledger::{DateWindow, LoanFilter, LoanLedger, PageLimits};
use crate::loan::{
    classify_loan, classify_with_schedule, Client, ClassifiedLoan, DelinquencyPolicy, LoanOfficer,
    LoanRecord, LoanStats, LoanStatus, Money, StaffRole,
};

/// Reference date and rules a query is evaluated under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingContext {
    pub as_of: NaiveDate,
    pub policy: DelinquencyPolicy,
}

impl ReportingContext {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            policy: DelinquencyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DelinquencyPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A client with their footprint in one officer's book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorrowerSummary {
    pub client: Client,
    pub loan_count: u64,
    pub total_borrowed: Money,
}

/// Rollup for one officer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficerStats {
    pub officer: LoanOfficer,
    pub stats: LoanStats,
}

/// Loan query service
pub struct LoanService<L> {
    ledger: L,
    policy: DelinquencyPolicy,
    limits: PageLimits,
}

impl<L: LoanLedger> LoanService<L> {
    /// Create a new loan service over a ledger
    pub fn new(ledger: L, policy: DelinquencyPolicy, limits: PageLimits) -> Self {
        Self {
            ledger,
            policy,
            limits,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    /// Context for `as_of`, using the configured threshold unless overridden.
    pub fn context(&self, as_of: NaiveDate, threshold_days: Option<u32>) -> ReportingContext {
        let policy = threshold_days
            .map(DelinquencyPolicy::with_threshold)
            .unwrap_or(self.policy);
        ReportingContext::new(as_of).with_policy(policy)
    }

    /// Resolve a staff user holding the loan officer role.
    async fn require_officer(&self, officer_id: Uuid) -> LoanResult<LoanOfficer> {
        self.ledger
            .find_officer(officer_id)
            .await?
            .filter(|officer| officer.role == StaffRole::LoanOfficer)
            .ok_or_else(|| LoanError::NotFound(format!("loan officer {}", officer_id)))
    }

    fn classify_all(
        records: &[LoanRecord],
        ctx: &ReportingContext,
    ) -> LoanResult<Vec<ClassifiedLoan>> {
        records
            .iter()
            .map(|r| classify_loan(r, ctx.as_of, &ctx.policy))
            .collect()
    }

    /// Rollup of every loan assigned to an officer.
    ///
    /// An officer without loans gets zero stats; an unknown officer is
    /// `NotFound`.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn stats_for_officer(
        &self,
        officer_id: Uuid,
        ctx: &ReportingContext,
    ) -> LoanResult<LoanStats> {
        self.require_officer(officer_id).await?;

        let records = self
            .ledger
            .fetch_loans(&LoanFilter::for_officer(officer_id), None)
            .await?;
        let stats: LoanStats = Self::classify_all(&records, ctx)?.iter().sum();

        tracing::info!(
            total_loans = stats.total_loans,
            active_loans = stats.active_loans,
            "Computed officer stats"
        );

        Ok(stats)
    }

    /// Officer's loans, newest first, with derived status.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn assigned_loans(
        &self,
        officer_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
        ctx: &ReportingContext,
    ) -> LoanResult<Vec<ClassifiedLoan>> {
        let page = self.limits.resolve(limit, offset)?;
        self.require_officer(officer_id).await?;

        let records = self
            .ledger
            .fetch_loans(&LoanFilter::for_officer(officer_id), Some(page))
            .await?;

        Self::classify_all(&records, ctx)
    }

    /// Officer's borrowers, newest client first.
    #[tracing::instrument(skip(self))]
    pub async fn assigned_borrowers(
        &self,
        officer_id: Uuid,
        limit: Option<i64>,
    ) -> LoanResult<Vec<BorrowerSummary>> {
        let page = self.limits.resolve(limit, None)?;
        self.require_officer(officer_id).await?;

        let records = self
            .ledger
            .fetch_loans(&LoanFilter::for_officer(officer_id), None)
            .await?;

        let mut footprint: HashMap<Uuid, (u64, Money)> = HashMap::new();
        for record in &records {
            let entry = footprint
                .entry(record.loan.client_id)
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += record.loan.principal();
        }

        let client_ids: Vec<Uuid> = footprint.keys().copied().collect();
        let mut clients = self.ledger.fetch_clients(&client_ids).await?;
        if let Some(orphan) = records
            .iter()
            .find(|r| !clients.iter().any(|c| c.id == r.loan.client_id))
        {
            tracing::warn!(
                loan_number = %orphan.loan.loan_number,
                client_id = %orphan.loan.client_id,
                "Loan references a client missing from the ledger"
            );
            return Err(LoanError::integrity(
                &orphan.loan.loan_number,
                format!("references unknown client {}", orphan.loan.client_id),
            ));
        }

        clients.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.client_number.cmp(&b.client_number))
        });

        Ok(clients
            .into_iter()
            .take(page.limit as usize)
            .filter_map(|client| {
                footprint
                    .get(&client.id)
                    .map(|&(loan_count, total_borrowed)| BorrowerSummary {
                        client,
                        loan_count,
                        total_borrowed,
                    })
            })
            .collect())
    }

    /// Rollup of the whole book, optionally limited to an application window.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn portfolio_stats(
        &self,
        window: DateWindow,
        ctx: &ReportingContext,
    ) -> LoanResult<LoanStats> {
        let records = self
            .ledger
            .fetch_loans(&LoanFilter::default().with_window(window), None)
            .await?;
        let stats: LoanStats = Self::classify_all(&records, ctx)?.iter().sum();

        tracing::info!(
            total_loans = stats.total_loans,
            arrears_loans = stats.arrears_loans,
            "Computed portfolio stats"
        );

        Ok(stats)
    }

    /// One rollup per loan officer, ordered by name.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn officer_breakdown(
        &self,
        window: DateWindow,
        ctx: &ReportingContext,
    ) -> LoanResult<Vec<OfficerStats>> {
        let officers = self.ledger.list_officers().await?;
        let records = self
            .ledger
            .fetch_loans(&LoanFilter::default().with_window(window), None)
            .await?;

        let mut per_officer: HashMap<Uuid, LoanStats> = HashMap::new();
        for classified in Self::classify_all(&records, ctx)? {
            let slot = per_officer.entry(classified.loan.officer_id).or_default();
            *slot = std::mem::take(slot).merge(LoanStats::from_classified(&classified));
        }

        let mut breakdown: Vec<OfficerStats> = officers
            .into_iter()
            .filter(|o| o.role == StaffRole::LoanOfficer)
            .map(|officer| {
                let stats = per_officer.remove(&officer.id).unwrap_or_default();
                OfficerStats { officer, stats }
            })
            .collect();
        breakdown.sort_by(|a, b| a.officer.name.cmp(&b.officer.name));

        Ok(breakdown)
    }

    /// Loans whose derived status matches, newest first.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn loans_by_status(
        &self,
        status: LoanStatus,
        officer_id: Option<Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
        ctx: &ReportingContext,
    ) -> LoanResult<Vec<ClassifiedLoan>> {
        let page = self.limits.resolve(limit, offset)?;
        let filter = match officer_id {
            Some(id) => {
                self.require_officer(id).await?;
                LoanFilter::for_officer(id)
            }
            None => LoanFilter::default(),
        };

        let records = self.ledger.fetch_loans(&filter, None).await?;
        let matching: Vec<ClassifiedLoan> = Self::classify_all(&records, ctx)?
            .into_iter()
            .filter(|c| c.status() == status)
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        tracing::debug!(count = matching.len(), "Filtered loans by derived status");

        Ok(matching)
    }

    /// A single loan with its installment-level standing.
    #[tracing::instrument(skip(self, ctx), fields(as_of = %ctx.as_of))]
    pub async fn loan_detail(
        &self,
        loan_number: &str,
        ctx: &ReportingContext,
    ) -> LoanResult<ClassifiedLoan> {
        let record = self
            .ledger
            .find_loan(loan_number)
            .await?
            .ok_or_else(|| LoanError::NotFound(format!("loan {}", loan_number)))?;

        classify_with_schedule(&record, ctx.as_of, &ctx.policy)
    }
}
