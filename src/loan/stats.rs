//! Loan book statistics
//!
//! Rollups are built per loan and combined with [`LoanStats::merge`], which is
//! plain field-wise addition. That keeps the merge associative and
//! commutative, so a book can be partitioned (per officer, per batch) and the
//! partial results combined in any order.

use std::iter::Sum;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanResult;
use crate::loan::classifier::{classify, ClassifiedLoan, DelinquencyPolicy};
use crate::loan::model::{LoanRecord, LoanStatus, Money};

/// Aggregate figures over a set of loans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanStats {
    pub total_loans: u64,
    /// Classified `active` or `disbursed`
    pub active_loans: u64,
    /// Disbursed amount, or applied amount for loans not yet disbursed
    pub total_amount: Money,
    /// Disbursed amount of completed loans
    pub collections_total: Money,
    pub pending_loans: u64,
    pub missed_repayment_loans: u64,
    pub arrears_loans: u64,
    pub completed_loans: u64,
    pub written_off_loans: u64,
    pub outstanding_balance: Money,
    pub overdue_amount: Money,
}

impl LoanStats {
    /// Stats for a single classified loan.
    pub fn from_classified(classified: &ClassifiedLoan) -> Self {
        let loan = &classified.loan;
        let c = &classified.classification;
        let status = c.status;

        let mut stats = LoanStats {
            total_loans: 1,
            total_amount: loan.principal(),
            outstanding_balance: c.outstanding_balance,
            overdue_amount: c.overdue_amount,
            ..LoanStats::default()
        };

        match status {
            LoanStatus::Active | LoanStatus::Disbursed => stats.active_loans = 1,
            LoanStatus::Pending | LoanStatus::Approved => stats.pending_loans = 1,
            LoanStatus::MissedRepayment => stats.missed_repayment_loans = 1,
            LoanStatus::PendingArrears | LoanStatus::Arrears => stats.arrears_loans = 1,
            LoanStatus::Completed => {
                stats.completed_loans = 1;
                stats.collections_total = loan.disbursed_amount.unwrap_or(Decimal::ZERO);
            }
            LoanStatus::WrittenOff => stats.written_off_loans = 1,
        }

        stats
    }

    /// Combine two disjoint rollups.
    pub fn merge(self, other: LoanStats) -> LoanStats {
        LoanStats {
            total_loans: self.total_loans + other.total_loans,
            active_loans: self.active_loans + other.active_loans,
            total_amount: self.total_amount + other.total_amount,
            collections_total: self.collections_total + other.collections_total,
            pending_loans: self.pending_loans + other.pending_loans,
            missed_repayment_loans: self.missed_repayment_loans + other.missed_repayment_loans,
            arrears_loans: self.arrears_loans + other.arrears_loans,
            completed_loans: self.completed_loans + other.completed_loans,
            written_off_loans: self.written_off_loans + other.written_off_loans,
            outstanding_balance: self.outstanding_balance + other.outstanding_balance,
            overdue_amount: self.overdue_amount + other.overdue_amount,
        }
    }
}

impl Sum for LoanStats {
    fn sum<I: Iterator<Item = LoanStats>>(iter: I) -> Self {
        iter.fold(LoanStats::default(), LoanStats::merge)
    }
}

impl<'a> Sum<&'a ClassifiedLoan> for LoanStats {
    fn sum<I: Iterator<Item = &'a ClassifiedLoan>>(iter: I) -> Self {
        iter.map(LoanStats::from_classified).sum()
    }
}

/// Classify every loan as of `today` and roll them up.
///
/// An empty set yields all-zero stats. A loan that fails classification
/// aborts the rollup rather than being guessed at.
pub fn aggregate(
    records: &[LoanRecord],
    today: NaiveDate,
    policy: &DelinquencyPolicy,
) -> LoanResult<LoanStats> {
    records.iter().try_fold(LoanStats::default(), |acc, record| {
        let classification = classify(record, today, policy)?;
        let classified = ClassifiedLoan {
            loan: record.loan.clone(),
            classification,
            schedule: None,
        };
        Ok(acc.merge(LoanStats::from_classified(&classified)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_is_all_zero() {
        let stats = LoanStats::default();
        assert_eq!(stats.total_loans, 0);
        assert_eq!(stats.active_loans, 0);
        assert_eq!(stats.total_amount, Decimal::ZERO);
        assert_eq!(stats.collections_total, Decimal::ZERO);
    }

    #[test]
    fn test_merge_adds_fields() {
        let a = LoanStats {
            total_loans: 2,
            active_loans: 1,
            total_amount: dec!(150.25),
            ..LoanStats::default()
        };
        let b = LoanStats {
            total_loans: 1,
            completed_loans: 1,
            total_amount: dec!(49.75),
            collections_total: dec!(49.75),
            ..LoanStats::default()
        };

        let merged = a.clone().merge(b.clone());
        assert_eq!(merged.total_loans, 3);
        assert_eq!(merged.total_amount, dec!(200.00));
        assert_eq!(merged.collections_total, dec!(49.75));
        assert_eq!(merged, b.merge(a));
    }

    #[test]
    fn test_empty_aggregate() {
        let stats = aggregate(
            &[],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            &DelinquencyPolicy::default(),
        )
        .unwrap();
        assert_eq!(stats, LoanStats::default());
    }
}
