//! Loan ledger models for the loanbook backend

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LoanError;

/// All monetary values. Exact decimal, never f64.
pub type Money = Decimal;

/// Loan status enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Active,
    Disbursed,
    Completed,
    MissedRepayment,
    PendingArrears,
    Arrears,
    WrittenOff,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 9] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Active,
        LoanStatus::Disbursed,
        LoanStatus::Completed,
        LoanStatus::MissedRepayment,
        LoanStatus::PendingArrears,
        LoanStatus::Arrears,
        LoanStatus::WrittenOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Active => "active",
            LoanStatus::Disbursed => "disbursed",
            LoanStatus::Completed => "completed",
            LoanStatus::MissedRepayment => "missed_repayment",
            LoanStatus::PendingArrears => "pending_arrears",
            LoanStatus::Arrears => "arrears",
            LoanStatus::WrittenOff => "written_off",
        }
    }

    /// Completed and written-off loans never change status on classification.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::WrittenOff)
    }

    /// Statuses a loan can only hold before funds are released.
    pub fn is_pre_disbursement(&self) -> bool {
        matches!(self, LoanStatus::Pending | LoanStatus::Approved)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LoanError::InvalidArgument(format!("unknown loan status '{}'", s)))
    }
}

/// Staff roles that can read the loan book
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Supervisor,
    LoanOfficer,
    Cashier,
}

impl StaffRole {
    /// Admins and supervisors see every officer's book.
    pub fn can_view_portfolio(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::Supervisor)
    }
}

impl FromStr for StaffRole {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "supervisor" => Ok(StaffRole::Supervisor),
            "loan_officer" | "loan-officer" | "officer" => Ok(StaffRole::LoanOfficer),
            "cashier" => Ok(StaffRole::Cashier),
            _ => Err(LoanError::InvalidArgument(format!("unknown staff role '{}'", s))),
        }
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Loan {
    pub id: Uuid,
    pub loan_number: String,
    pub client_id: Uuid,
    pub officer_id: Uuid,
    pub applied_amount: Option<Money>,
    pub approved_amount: Option<Money>,
    pub disbursed_amount: Option<Money>,
    pub application_date: NaiveDate,
    pub disbursement_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    /// Status as persisted. Delinquency is derived on read, see `classifier`.
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Disbursed amount when funds went out, otherwise the applied amount.
    pub fn principal(&self) -> Money {
        self.disbursed_amount
            .or(self.applied_amount)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Scheduled installment
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Installment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub due_date: NaiveDate,
    pub amount_due: Money,
}

/// Recorded payment. Reversals are negative amounts.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub amount: Money,
    pub received_on: NaiveDate,
    pub installment_id: Option<Uuid>,
}

/// Borrower
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub client_number: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Staff user loans are assigned to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoanOfficer {
    pub id: Uuid,
    pub name: String,
    pub role: StaffRole,
}

/// A loan together with everything the classifier needs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoanRecord {
    pub loan: Loan,
    /// Ordered by due date.
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
}

impl LoanRecord {
    pub fn new(loan: Loan, mut installments: Vec<Installment>, payments: Vec<Payment>) -> Self {
        installments.sort_by_key(|i| i.due_date);
        Self {
            loan,
            installments,
            payments,
        }
    }
}
