//! In-memory loan ledger

use std::cmp::Reverse;

use uuid::Uuid;

use super::{LoanFilter, LoanLedger, Page};
use crate::error::LoanResult;
use crate::loan::{Client, LoanOfficer, LoanRecord};

/// Ledger backed by owned vectors
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    officers: Vec<LoanOfficer>,
    clients: Vec<Client>,
    loans: Vec<LoanRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_officer(mut self, officer: LoanOfficer) -> Self {
        self.officers.push(officer);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.push(client);
        self
    }

    pub fn with_loan(mut self, mut record: LoanRecord) -> Self {
        record.installments.sort_by_key(|i| i.due_date);
        self.loans.push(record);
        self
    }

    fn matching(&self, filter: &LoanFilter) -> Vec<LoanRecord> {
        let mut loans: Vec<LoanRecord> = self
            .loans
            .iter()
            .filter(|r| filter.officer_id.map_or(true, |id| r.loan.officer_id == id))
            .filter(|r| filter.window.contains(r.loan.application_date))
            .cloned()
            .collect();
        loans.sort_by(|a, b| {
            Reverse(a.loan.created_at)
                .cmp(&Reverse(b.loan.created_at))
                .then_with(|| a.loan.loan_number.cmp(&b.loan.loan_number))
        });
        loans
    }
}

impl LoanLedger for InMemoryLedger {
    async fn find_officer(&self, officer_id: Uuid) -> LoanResult<Option<LoanOfficer>> {
        Ok(self.officers.iter().find(|o| o.id == officer_id).cloned())
    }

    async fn list_officers(&self) -> LoanResult<Vec<LoanOfficer>> {
        Ok(self.officers.clone())
    }

    async fn find_loan(&self, loan_number: &str) -> LoanResult<Option<LoanRecord>> {
        Ok(self
            .loans
            .iter()
            .find(|r| r.loan.loan_number == loan_number)
            .cloned())
    }

    async fn fetch_loans(
        &self,
        filter: &LoanFilter,
        page: Option<Page>,
    ) -> LoanResult<Vec<LoanRecord>> {
        let loans = self.matching(filter);
        Ok(match page {
            Some(page) => loans
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect(),
            None => loans,
        })
    }

    async fn fetch_clients(&self, ids: &[Uuid]) -> LoanResult<Vec<Client>> {
        Ok(self
            .clients
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}
