//! Read-only access to the loan ledger
//!
//! The query façade never talks to a database directly; it reads loans,
//! schedules, payments, clients and officers through [`LoanLedger`].
//! `PgLedger` serves production, `InMemoryLedger` serves fixtures and tests.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LoanError, LoanResult};
use crate::loan::{Client, LoanOfficer, LoanRecord};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;

/// Store of loan facts the core reads from
///
/// Loans come back ordered by creation time, newest first, ties broken by
/// loan number. Installments within a record are ordered by due date.
pub trait LoanLedger: Send + Sync + 'static {
    fn find_officer(
        &self,
        officer_id: Uuid,
    ) -> impl Future<Output = LoanResult<Option<LoanOfficer>>> + Send;

    fn list_officers(&self) -> impl Future<Output = LoanResult<Vec<LoanOfficer>>> + Send;

    fn find_loan(
        &self,
        loan_number: &str,
    ) -> impl Future<Output = LoanResult<Option<LoanRecord>>> + Send;

    fn fetch_loans(
        &self,
        filter: &LoanFilter,
        page: Option<Page>,
    ) -> impl Future<Output = LoanResult<Vec<LoanRecord>>> + Send;

    fn fetch_clients(&self, ids: &[Uuid]) -> impl Future<Output = LoanResult<Vec<Client>>> + Send;
}

/// Inclusive application-date window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> LoanResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(LoanError::InvalidArgument(format!(
                    "date window starts after it ends ({} > {})",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// Build a window from raw `YYYY-MM-DD` query values.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> LoanResult<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Parse an optional ISO date, treating blank input as absent.
pub fn parse_date(raw: Option<&str>) -> LoanResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| LoanError::InvalidArgument(format!("unparseable date '{}'", s))),
    }
}

/// Which loans to read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub officer_id: Option<Uuid>,
    pub window: DateWindow,
}

impl LoanFilter {
    pub fn for_officer(officer_id: Uuid) -> Self {
        Self {
            officer_id: Some(officer_id),
            window: DateWindow::default(),
        }
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }
}

/// A bounded slice of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

/// Default and ceiling for list sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 200,
        }
    }
}

impl PageLimits {
    /// Turn raw caller input into a page.
    ///
    /// Negative values are rejected. Zero and anything above the ceiling are
    /// clamped into `1..=max_limit`.
    pub fn resolve(&self, limit: Option<i64>, offset: Option<i64>) -> LoanResult<Page> {
        let limit = match limit {
            None => i64::from(self.default_limit),
            Some(l) if l < 0 => {
                return Err(LoanError::InvalidArgument(format!(
                    "limit must be positive, got {}",
                    l
                )))
            }
            Some(l) => l,
        };
        let offset = match offset {
            None => 0,
            Some(o) if o < 0 => {
                return Err(LoanError::InvalidArgument(format!(
                    "offset must not be negative, got {}",
                    o
                )))
            }
            Some(o) => o,
        };

        let max = self.max_limit.max(1);
        Ok(Page {
            limit: limit.clamp(1, i64::from(max)) as u32,
            offset: offset.min(i64::from(u32::MAX)) as u32,
        })
    }
}
