//! Delinquency classification
//!
//! A loan's delinquency status is derived on read from its schedule, its
//! payments and an explicit reference date. Nothing here touches a clock or
//! the store, so identical inputs always classify identically.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LoanError, LoanResult};
use crate::loan::model::{Installment, Loan, LoanRecord, LoanStatus, Money, Payment};

/// Default grace window before a missed repayment becomes arrears
pub const DEFAULT_ARREARS_THRESHOLD_DAYS: u32 = 30;

/// Tunable classification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelinquencyPolicy {
    /// Days past due still treated as a missed repayment (inclusive)
    pub arrears_threshold_days: u32,
}

impl Default for DelinquencyPolicy {
    fn default() -> Self {
        Self {
            arrears_threshold_days: DEFAULT_ARREARS_THRESHOLD_DAYS,
        }
    }
}

impl DelinquencyPolicy {
    pub fn with_threshold(arrears_threshold_days: u32) -> Self {
        Self {
            arrears_threshold_days,
        }
    }
}

/// Outcome of classifying one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: LoanStatus,
    /// Days since the oldest unpaid due date, 0 when current
    pub days_past_due: i64,
    /// Shortfall on installments already due
    pub overdue_amount: Money,
    pub total_paid: Money,
    pub outstanding_balance: Money,
}

/// Payment position of a single installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentStanding {
    pub installment_id: Uuid,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub overdue: bool,
}

/// Loan as presented to callers, with its derived status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLoan {
    pub loan: Loan,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<InstallmentStanding>>,
}

impl ClassifiedLoan {
    pub fn status(&self) -> LoanStatus {
        self.classification.status
    }
}

/// Classify a loan as of `today`.
///
/// Terminal loans (`completed`, `written_off`) and loans that have not been
/// disbursed keep their stored status. Every other loan is classified from
/// its unpaid installments:
///
/// - nothing unpaid: `active`
/// - past maturity with anything unpaid: `arrears`
/// - latest unpaid installment part-paid: `pending`
/// - days past due within the threshold: `missed_repayment`
/// - otherwise: `arrears`
pub fn classify(
    record: &LoanRecord,
    today: NaiveDate,
    policy: &DelinquencyPolicy,
) -> LoanResult<Classification> {
    evaluate(record, today, policy).map(|(classification, _)| classification)
}

/// Classify a loan and keep the per-installment breakdown.
pub fn classify_with_schedule(
    record: &LoanRecord,
    today: NaiveDate,
    policy: &DelinquencyPolicy,
) -> LoanResult<ClassifiedLoan> {
    let (classification, standings) = evaluate(record, today, policy)?;
    Ok(ClassifiedLoan {
        loan: record.loan.clone(),
        classification,
        schedule: Some(standings),
    })
}

/// Classify a loan into the summary form used by list views.
pub fn classify_loan(
    record: &LoanRecord,
    today: NaiveDate,
    policy: &DelinquencyPolicy,
) -> LoanResult<ClassifiedLoan> {
    let classification = classify(record, today, policy)?;
    Ok(ClassifiedLoan {
        loan: record.loan.clone(),
        classification,
        schedule: None,
    })
}

fn evaluate(
    record: &LoanRecord,
    today: NaiveDate,
    policy: &DelinquencyPolicy,
) -> LoanResult<(Classification, Vec<InstallmentStanding>)> {
    let loan = &record.loan;

    if let Err(e) = check_integrity(loan, &record.installments) {
        tracing::warn!(
            loan_number = %loan.loan_number,
            stored_status = %loan.status,
            error = %e,
            "Refusing to classify inconsistent loan"
        );
        return Err(e);
    }

    // Records built outside `LoanRecord::new` may arrive unsorted
    let mut installments = record.installments.clone();
    installments.sort_by_key(|i| i.due_date);

    let counted: Vec<&Payment> = record
        .payments
        .iter()
        .filter(|p| p.received_on <= today)
        .collect();
    let total_paid: Money = counted.iter().map(|p| p.amount).sum();
    let scheduled: Money = installments.iter().map(|i| i.amount_due).sum();
    let outstanding_balance = (scheduled - total_paid).max(Decimal::ZERO);

    let allocated = allocate(&installments, &counted);
    let standings: Vec<InstallmentStanding> = installments
        .iter()
        .zip(allocated.iter())
        .map(|(installment, paid)| InstallmentStanding {
            installment_id: installment.id,
            due_date: installment.due_date,
            amount_due: installment.amount_due,
            amount_paid: *paid,
            overdue: installment.due_date <= today && *paid < installment.amount_due,
        })
        .collect();

    if loan.status.is_terminal() || loan.status.is_pre_disbursement() {
        let classification = Classification {
            status: loan.status,
            days_past_due: 0,
            overdue_amount: Decimal::ZERO,
            total_paid,
            outstanding_balance: if loan.status.is_pre_disbursement() {
                Decimal::ZERO
            } else {
                outstanding_balance
            },
        };
        return Ok((classification, standings));
    }

    let unpaid: Vec<&InstallmentStanding> = standings.iter().filter(|s| s.overdue).collect();

    let (oldest, latest) = match (unpaid.first(), unpaid.last()) {
        (Some(oldest), Some(latest)) => (*oldest, *latest),
        _ => {
            let classification = Classification {
                status: LoanStatus::Active,
                days_past_due: 0,
                overdue_amount: Decimal::ZERO,
                total_paid,
                outstanding_balance,
            };
            return Ok((classification, standings));
        }
    };

    let days_past_due = (today - oldest.due_date).num_days().max(1);
    let overdue_amount: Money = unpaid.iter().map(|s| s.amount_due - s.amount_paid).sum();

    let maturity = loan
        .maturity_date
        .or_else(|| installments.last().map(|i| i.due_date));
    let matured = maturity.map_or(false, |m| today > m);
    let part_paid = latest.amount_paid > Decimal::ZERO && latest.amount_paid < latest.amount_due;

    let status = if matured {
        LoanStatus::Arrears
    } else if part_paid {
        LoanStatus::Pending
    } else if days_past_due <= i64::from(policy.arrears_threshold_days) {
        LoanStatus::MissedRepayment
    } else {
        LoanStatus::Arrears
    };

    Ok((
        Classification {
            status,
            days_past_due,
            overdue_amount,
            total_paid,
            outstanding_balance,
        },
        standings,
    ))
}

/// Check the stored loan against the lifecycle invariants.
pub fn check_integrity(loan: &Loan, installments: &[Installment]) -> LoanResult<()> {
    if loan.approved_amount.is_some() && loan.applied_amount.is_none() {
        return Err(LoanError::integrity(
            &loan.loan_number,
            "approved amount set without an applied amount",
        ));
    }
    if loan.disbursed_amount.is_some() && loan.approved_amount.is_none() {
        return Err(LoanError::integrity(
            &loan.loan_number,
            "disbursed amount set without an approved amount",
        ));
    }
    if loan.disbursed_amount.is_some() && loan.status.is_pre_disbursement() {
        return Err(LoanError::integrity(
            &loan.loan_number,
            format!("disbursed amount set but status is still {}", loan.status),
        ));
    }
    if loan.disbursed_amount.is_none()
        && !loan.status.is_pre_disbursement()
        && !loan.status.is_terminal()
    {
        return Err(LoanError::integrity(
            &loan.loan_number,
            format!("status {} requires a disbursed amount", loan.status),
        ));
    }
    if let Some(bad) = installments.iter().find(|i| i.amount_due < Decimal::ZERO) {
        return Err(LoanError::integrity(
            &loan.loan_number,
            format!("installment due {} has a negative amount", bad.due_date),
        ));
    }
    Ok(())
}

/// Spread payments over the schedule.
///
/// Payments pointing at an installment credit it first. Everything else,
/// including any overpayment on an allocated installment, pays down the
/// remaining installments oldest first. Returns one amount per installment.
fn allocate(installments: &[Installment], payments: &[&Payment]) -> Vec<Money> {
    let mut explicit: HashMap<Uuid, Money> = HashMap::new();
    let mut pool = Decimal::ZERO;

    for payment in payments {
        match payment.installment_id {
            Some(id) if installments.iter().any(|i| i.id == id) => {
                *explicit.entry(id).or_insert(Decimal::ZERO) += payment.amount;
            }
            _ => pool += payment.amount,
        }
    }

    let mut allocated: Vec<Money> = installments
        .iter()
        .map(|i| {
            let credited = explicit
                .get(&i.id)
                .copied()
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO);
            if credited > i.amount_due {
                pool += credited - i.amount_due;
                i.amount_due
            } else {
                credited
            }
        })
        .collect();

    let mut pool = pool.max(Decimal::ZERO);
    for (installment, paid) in installments.iter().zip(allocated.iter_mut()) {
        if pool <= Decimal::ZERO {
            break;
        }
        let take = (installment.amount_due - *paid).min(pool);
        *paid += take;
        pool -= take;
    }

    allocated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(status: LoanStatus) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            loan_number: "LN-0001".to_string(),
            client_id: Uuid::new_v4(),
            officer_id: Uuid::new_v4(),
            applied_amount: Some(dec!(600)),
            approved_amount: Some(dec!(600)),
            disbursed_amount: Some(dec!(600)),
            application_date: date(2024, 1, 1),
            disbursement_date: Some(date(2024, 1, 5)),
            maturity_date: Some(date(2024, 7, 5)),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    fn installment(loan: &Loan, due: NaiveDate, amount: Money) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            due_date: due,
            amount_due: amount,
        }
    }

    fn payment(loan: &Loan, amount: Money, on: NaiveDate, to: Option<Uuid>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            amount,
            received_on: on,
            installment_id: to,
        }
    }

    #[test]
    fn test_allocate_explicit_then_oldest_first() {
        let l = loan(LoanStatus::Active);
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let b = installment(&l, date(2024, 3, 5), dec!(100));
        let p1 = payment(&l, dec!(150), date(2024, 2, 1), Some(b.id));
        let p2 = payment(&l, dec!(30), date(2024, 2, 1), None);

        let allocated = allocate(&[a, b], &[&p1, &p2]);
        assert_eq!(allocated, vec![dec!(80), dec!(100)]);
    }

    #[test]
    fn test_allocate_reversal_cancels_payment() {
        let l = loan(LoanStatus::Active);
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let p1 = payment(&l, dec!(100), date(2024, 2, 1), None);
        let p2 = payment(&l, dec!(-100), date(2024, 2, 3), None);

        let allocated = allocate(&[a], &[&p1, &p2]);
        assert_eq!(allocated, vec![dec!(0)]);
    }

    #[test]
    fn test_future_payments_ignored() {
        let l = loan(LoanStatus::Active);
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let p = payment(&l, dec!(100), date(2024, 2, 20), None);
        let record = LoanRecord::new(l, vec![a], vec![p]);

        let c = classify(&record, date(2024, 2, 10), &DelinquencyPolicy::default()).unwrap();
        assert_eq!(c.status, LoanStatus::MissedRepayment);
        assert_eq!(c.total_paid, dec!(0));
        assert_eq!(c.days_past_due, 5);
    }

    #[test]
    fn test_due_today_counts_one_day() {
        let l = loan(LoanStatus::Active);
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let record = LoanRecord::new(l, vec![a], vec![]);

        let c = classify(&record, date(2024, 2, 5), &DelinquencyPolicy::default()).unwrap();
        assert_eq!(c.status, LoanStatus::MissedRepayment);
        assert_eq!(c.days_past_due, 1);
        assert_eq!(c.overdue_amount, dec!(100));
    }

    #[test]
    fn test_pre_disbursement_keeps_status() {
        let mut l = loan(LoanStatus::Approved);
        l.disbursed_amount = None;
        let record = LoanRecord::new(l, vec![], vec![]);

        let c = classify(&record, date(2024, 2, 5), &DelinquencyPolicy::default()).unwrap();
        assert_eq!(c.status, LoanStatus::Approved);
        assert_eq!(c.outstanding_balance, dec!(0));
    }

    #[test]
    fn test_integrity_disbursed_but_pending() {
        let l = loan(LoanStatus::Pending);
        let record = LoanRecord::new(l, vec![], vec![]);

        let err = classify(&record, date(2024, 2, 5), &DelinquencyPolicy::default()).unwrap_err();
        assert!(matches!(err, LoanError::DataIntegrity { .. }));
    }

    #[test]
    fn test_integrity_active_without_disbursement() {
        let mut l = loan(LoanStatus::Active);
        l.disbursed_amount = None;
        assert!(check_integrity(&l, &[]).is_err());
    }

    #[test]
    fn test_integrity_amount_chain() {
        let mut l = loan(LoanStatus::Active);
        l.approved_amount = None;
        assert!(check_integrity(&l, &[]).is_err());

        let mut l = loan(LoanStatus::Pending);
        l.disbursed_amount = None;
        l.applied_amount = None;
        assert!(check_integrity(&l, &[]).is_err());
    }

    #[test]
    fn test_schedule_standing_reported() {
        let l = loan(LoanStatus::Active);
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let b = installment(&l, date(2024, 3, 5), dec!(100));
        let p = payment(&l, dec!(100), date(2024, 2, 4), None);
        let record = LoanRecord::new(l, vec![a, b], vec![p]);

        let classified =
            classify_with_schedule(&record, date(2024, 3, 10), &DelinquencyPolicy::default())
                .unwrap();
        let schedule = classified.schedule.unwrap();
        assert!(!schedule[0].overdue);
        assert!(schedule[1].overdue);
        assert_eq!(classified.classification.status, LoanStatus::MissedRepayment);
        assert_eq!(classified.classification.outstanding_balance, dec!(100));
    }

    #[test]
    fn test_unsorted_schedule_classified_by_due_date() {
        let mut l = loan(LoanStatus::Active);
        l.maturity_date = None;
        let a = installment(&l, date(2024, 2, 5), dec!(100));
        let b = installment(&l, date(2024, 3, 5), dec!(100));
        let p = payment(&l, dec!(100), date(2024, 2, 4), None);

        let sorted = LoanRecord::new(l.clone(), vec![a.clone(), b.clone()], vec![p.clone()]);
        let unsorted = LoanRecord {
            loan: l,
            installments: vec![b, a],
            payments: vec![p],
        };

        let policy = DelinquencyPolicy::default();
        let c = classify(&unsorted, date(2024, 3, 5), &policy).unwrap();
        assert_eq!(c.status, LoanStatus::MissedRepayment);
        assert_eq!(c.days_past_due, 1);
        assert_eq!(c, classify(&sorted, date(2024, 3, 5), &policy).unwrap());

        // Maturity falls back to the latest due date, not the last element
        let late = classify(&unsorted, date(2024, 3, 6), &policy).unwrap();
        assert_eq!(late.status, LoanStatus::Arrears);
    }
}
