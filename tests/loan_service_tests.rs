//! Query service tests over an in-memory ledger

mod common;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{at, client, date, officer, LoanBuilder};
use loanbook_server::error::LoanError;
use loanbook_server::ledger::{DateWindow, InMemoryLedger, PageLimits};
use loanbook_server::loan::{DelinquencyPolicy, LoanOfficer, LoanStats, LoanStatus, StaffRole};
use loanbook_server::loan_service::{LoanService, ReportingContext};

struct Book {
    service: LoanService<InMemoryLedger>,
    alice: LoanOfficer,
    bob: LoanOfficer,
    idle: LoanOfficer,
    admin: LoanOfficer,
    first_client: Uuid,
    second_client: Uuid,
}

fn today() -> ReportingContext {
    ReportingContext::new(date(2024, 6, 1))
}

/// Alice: three loans over two clients. Bob: one loan in arrears.
/// Idle: no loans.
fn book() -> Book {
    let alice = officer("Alice");
    let bob = officer("Bob");
    let idle = officer("Idle");
    let first = client("CL-001", at(2023, 5, 1));
    let second = client("CL-002", at(2023, 9, 1));
    let admin = LoanOfficer {
        id: Uuid::new_v4(),
        name: "Admin".to_string(),
        role: StaffRole::Admin,
    };

    let ledger = InMemoryLedger::new()
        .with_officer(bob.clone())
        .with_officer(alice.clone())
        .with_officer(idle.clone())
        .with_officer(admin.clone())
        .with_client(first.clone())
        .with_client(second.clone())
        .with_loan(
            LoanBuilder::disbursed("LN-100", alice.id, first.id, dec!(1000))
                .status(LoanStatus::Completed)
                .applied_on(date(2024, 1, 5))
                .created(at(2024, 1, 5))
                .build(),
        )
        .with_loan(
            LoanBuilder::disbursed("LN-101", alice.id, second.id, dec!(500))
                .installment(date(2024, 7, 1), dec!(500))
                .applied_on(date(2024, 3, 5))
                .created(at(2024, 3, 5))
                .build(),
        )
        .with_loan(
            LoanBuilder::applied("LN-102", alice.id, first.id, dec!(300))
                .applied_on(date(2024, 5, 5))
                .created(at(2024, 5, 5))
                .build(),
        )
        .with_loan(
            LoanBuilder::disbursed("LN-200", bob.id, second.id, dec!(800))
                .installment(date(2024, 3, 1), dec!(400))
                .installment(date(2024, 4, 1), dec!(400))
                .applied_on(date(2024, 2, 1))
                .created(at(2024, 2, 1))
                .build(),
        );

    Book {
        service: LoanService::new(ledger, DelinquencyPolicy::default(), PageLimits::default()),
        alice,
        bob,
        idle,
        admin,
        first_client: first.id,
        second_client: second.id,
    }
}

#[tokio::test]
async fn test_stats_for_officer() {
    let book = book();
    let stats = book
        .service
        .stats_for_officer(book.alice.id, &today())
        .await
        .unwrap();

    assert_eq!(stats.total_loans, 3);
    assert_eq!(stats.active_loans, 1);
    assert_eq!(stats.total_amount, dec!(1800));
    assert_eq!(stats.collections_total, dec!(1000));
}

#[tokio::test]
async fn test_stats_for_officer_without_loans_is_zero() {
    let book = book();
    let stats = book
        .service
        .stats_for_officer(book.idle.id, &today())
        .await
        .unwrap();
    assert_eq!(stats, LoanStats::default());
}

#[tokio::test]
async fn test_unknown_officer_not_found() {
    let book = book();
    let unknown = Uuid::new_v4();

    let err = book
        .service
        .stats_for_officer(unknown, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));

    let err = book
        .service
        .assigned_loans(unknown, Some(5), None, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));

    let err = book
        .service
        .assigned_borrowers(unknown, Some(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));
}

#[tokio::test]
async fn test_assigned_loans_newest_first_with_status() {
    let book = book();
    let loans = book
        .service
        .assigned_loans(book.alice.id, Some(5), None, &today())
        .await
        .unwrap();

    let numbers: Vec<&str> = loans.iter().map(|l| l.loan.loan_number.as_str()).collect();
    assert_eq!(numbers, vec!["LN-102", "LN-101", "LN-100"]);

    let statuses: Vec<LoanStatus> = loans.iter().map(|l| l.status()).collect();
    assert_eq!(
        statuses,
        vec![LoanStatus::Pending, LoanStatus::Active, LoanStatus::Completed]
    );
}

#[tokio::test]
async fn test_assigned_loans_paging_and_clamping() {
    let book = book();
    let svc = &book.service;

    let first = svc
        .assigned_loans(book.alice.id, Some(0), None, &today())
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].loan.loan_number, "LN-102");

    let second_page = svc
        .assigned_loans(book.alice.id, Some(1), Some(1), &today())
        .await
        .unwrap();
    assert_eq!(second_page[0].loan.loan_number, "LN-101");

    let everything = svc
        .assigned_loans(book.alice.id, Some(10_000), None, &today())
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);

    let err = svc
        .assigned_loans(book.alice.id, Some(-1), None, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_assigned_borrowers_grouped_by_client() {
    let book = book();
    let borrowers = book
        .service
        .assigned_borrowers(book.alice.id, None)
        .await
        .unwrap();

    assert_eq!(borrowers.len(), 2);

    // CL-002 was created after CL-001
    assert_eq!(borrowers[0].client.id, book.second_client);
    assert_eq!(borrowers[0].loan_count, 1);
    assert_eq!(borrowers[0].total_borrowed, dec!(500));

    assert_eq!(borrowers[1].client.id, book.first_client);
    assert_eq!(borrowers[1].loan_count, 2);
    assert_eq!(borrowers[1].total_borrowed, dec!(1300));

    let limited = book
        .service
        .assigned_borrowers(book.alice.id, Some(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_portfolio_stats_with_window() {
    let book = book();

    let all = book
        .service
        .portfolio_stats(DateWindow::default(), &today())
        .await
        .unwrap();
    assert_eq!(all.total_loans, 4);
    assert_eq!(all.arrears_loans, 1);
    assert_eq!(all.total_amount, dec!(2600));

    let window = DateWindow::new(Some(date(2024, 2, 1)), Some(date(2024, 3, 31))).unwrap();
    let q1 = book.service.portfolio_stats(window, &today()).await.unwrap();
    assert_eq!(q1.total_loans, 2);
    assert_eq!(q1.total_amount, dec!(1300));
}

#[tokio::test]
async fn test_officer_breakdown_merges_to_portfolio() {
    let book = book();
    let breakdown = book
        .service
        .officer_breakdown(DateWindow::default(), &today())
        .await
        .unwrap();

    let names: Vec<&str> = breakdown.iter().map(|o| o.officer.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Idle"]);
    assert_eq!(breakdown[2].stats, LoanStats::default());
    assert_eq!(breakdown[1].stats.arrears_loans, 1);

    let merged: LoanStats = breakdown.into_iter().map(|o| o.stats).sum();
    let portfolio = book
        .service
        .portfolio_stats(DateWindow::default(), &today())
        .await
        .unwrap();
    assert_eq!(merged, portfolio);
}

#[tokio::test]
async fn test_loans_by_status() {
    let book = book();

    let arrears = book
        .service
        .loans_by_status(LoanStatus::Arrears, None, None, None, &today())
        .await
        .unwrap();
    assert_eq!(arrears.len(), 1);
    assert_eq!(arrears[0].loan.loan_number, "LN-200");
    assert_eq!(arrears[0].classification.days_past_due, 92);
    assert_eq!(arrears[0].classification.overdue_amount, dec!(800));

    let alice_arrears = book
        .service
        .loans_by_status(LoanStatus::Arrears, Some(book.alice.id), None, None, &today())
        .await
        .unwrap();
    assert!(alice_arrears.is_empty());

    let err = book
        .service
        .loans_by_status(LoanStatus::Arrears, Some(Uuid::new_v4()), None, None, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));
}

#[tokio::test]
async fn test_threshold_override_changes_view() {
    let book = book();
    let lenient = book.service.context(date(2024, 6, 1), Some(120));
    assert_eq!(lenient.policy.arrears_threshold_days, 120);

    let missed = book
        .service
        .loans_by_status(LoanStatus::MissedRepayment, Some(book.bob.id), None, None, &lenient)
        .await
        .unwrap();
    assert_eq!(missed.len(), 1);

    let configured = book.service.context(date(2024, 6, 1), None);
    assert_eq!(configured.policy, DelinquencyPolicy::default());
}

#[tokio::test]
async fn test_loan_detail() {
    let book = book();
    let detail = book.service.loan_detail("LN-200", &today()).await.unwrap();

    assert_eq!(detail.status(), LoanStatus::Arrears);
    let schedule = detail.schedule.expect("detail includes schedule");
    assert_eq!(schedule.len(), 2);
    assert!(schedule.iter().all(|s| s.overdue));

    let err = book
        .service
        .loan_detail("LN-404", &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));
}

#[tokio::test]
async fn test_staff_without_officer_role_not_found() {
    let book = book();
    let cashier = LoanOfficer {
        id: Uuid::new_v4(),
        name: "Cashier".to_string(),
        role: StaffRole::Cashier,
    };
    let service = LoanService::new(
        InMemoryLedger::new().with_officer(cashier.clone()),
        DelinquencyPolicy::default(),
        PageLimits::default(),
    );

    let err = service
        .stats_for_officer(cashier.id, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));

    let err = book
        .service
        .stats_for_officer(book.admin.id, &today())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));

    let err = book
        .service
        .assigned_borrowers(book.admin.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LoanError::NotFound(_)));
}

#[tokio::test]
async fn test_borrower_missing_from_ledger_is_integrity_error() {
    let alice = officer("Alice");
    let known = client("CL-001", at(2023, 5, 1));
    let service = LoanService::new(
        InMemoryLedger::new()
            .with_officer(alice.clone())
            .with_client(known.clone())
            .with_loan(LoanBuilder::disbursed("LN-1", alice.id, known.id, dec!(100)).build())
            .with_loan(
                LoanBuilder::disbursed("LN-2", alice.id, Uuid::new_v4(), dec!(200)).build(),
            ),
        DelinquencyPolicy::default(),
        PageLimits::default(),
    );

    let err = service
        .assigned_borrowers(alice.id, None)
        .await
        .unwrap_err();
    match err {
        LoanError::DataIntegrity { loan_number, .. } => assert_eq!(loan_number, "LN-2"),
        other => panic!("expected data integrity error, got {:?}", other),
    }
}
