//! Shared loan book fixtures for integration tests

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use loanbook_server::loan::{
    Client, Installment, Loan, LoanOfficer, LoanRecord, LoanStatus, Money, Payment, StaffRole,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn officer(name: &str) -> LoanOfficer {
    LoanOfficer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        role: StaffRole::LoanOfficer,
    }
}

pub fn client(number: &str, created_at: DateTime<Utc>) -> Client {
    Client {
        id: Uuid::new_v4(),
        client_number: number.to_string(),
        name: format!("Borrower {}", number),
        created_at,
    }
}

/// Builds a `LoanRecord` one fact at a time
pub struct LoanBuilder {
    loan: Loan,
    installments: Vec<Installment>,
    payments: Vec<Payment>,
}

impl LoanBuilder {
    /// A disbursed, active loan with no schedule yet
    pub fn disbursed(number: &str, officer_id: Uuid, client_id: Uuid, amount: Money) -> Self {
        Self {
            loan: Loan {
                id: Uuid::new_v4(),
                loan_number: number.to_string(),
                client_id,
                officer_id,
                applied_amount: Some(amount),
                approved_amount: Some(amount),
                disbursed_amount: Some(amount),
                application_date: date(2024, 1, 2),
                disbursement_date: Some(date(2024, 1, 10)),
                maturity_date: Some(date(2025, 1, 10)),
                status: LoanStatus::Active,
                created_at: at(2024, 1, 2),
            },
            installments: Vec::new(),
            payments: Vec::new(),
        }
    }

    /// An application that has not been approved or disbursed
    pub fn applied(number: &str, officer_id: Uuid, client_id: Uuid, amount: Money) -> Self {
        let mut builder = Self::disbursed(number, officer_id, client_id, amount);
        builder.loan.approved_amount = None;
        builder.loan.disbursed_amount = None;
        builder.loan.disbursement_date = None;
        builder.loan.maturity_date = None;
        builder.loan.status = LoanStatus::Pending;
        builder
    }

    pub fn status(mut self, status: LoanStatus) -> Self {
        self.loan.status = status;
        self
    }

    pub fn maturity(mut self, maturity: Option<NaiveDate>) -> Self {
        self.loan.maturity_date = maturity;
        self
    }

    pub fn applied_on(mut self, day: NaiveDate) -> Self {
        self.loan.application_date = day;
        self
    }

    pub fn created(mut self, created_at: DateTime<Utc>) -> Self {
        self.loan.created_at = created_at;
        self
    }

    pub fn installment(mut self, due: NaiveDate, amount: Money) -> Self {
        self.installments.push(Installment {
            id: Uuid::new_v4(),
            loan_id: self.loan.id,
            due_date: due,
            amount_due: amount,
        });
        self
    }

    /// Unallocated payment
    pub fn payment(mut self, amount: Money, on: NaiveDate) -> Self {
        self.payments.push(Payment {
            id: Uuid::new_v4(),
            loan_id: self.loan.id,
            amount,
            received_on: on,
            installment_id: None,
        });
        self
    }

    /// Payment allocated to the installment at `index` (insertion order)
    pub fn payment_to(mut self, index: usize, amount: Money, on: NaiveDate) -> Self {
        let installment_id = self.installments[index].id;
        self.payments.push(Payment {
            id: Uuid::new_v4(),
            loan_id: self.loan.id,
            amount,
            received_on: on,
            installment_id: Some(installment_id),
        });
        self
    }

    pub fn build(self) -> LoanRecord {
        LoanRecord::new(self.loan, self.installments, self.payments)
    }
}

pub fn zero() -> Decimal {
    Decimal::ZERO
}
