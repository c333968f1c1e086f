mod common;

use common::{account, d, leave, setup, YEAR};
use rust_decimal::dec;

use leave_engine::leave::{LeaveError, ledger, lifecycle};
use leave_engine::store::LeaveStore;

/// `balance + used` is conserved across any approve/cancel sequence; only
/// provisioning and carry-forward may change the sum.
#[actix_web::test]
async fn entitlement_sum_is_conserved() {
    let org = setup().await;
    let sum = |pair: (rust_decimal::Decimal, rust_decimal::Decimal)| pair.0 + pair.1;

    let first = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 3), d(2, 4), 2),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, first).await.unwrap();
    assert_eq!(sum(account(&org.store, org.employee, org.casual, YEAR).await), dec!(10));

    let second = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(5, 1), d(5, 3), 3),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, second).await.unwrap();
    assert_eq!(sum(account(&org.store, org.employee, org.casual, YEAR).await), dec!(10));

    lifecycle::cancel(&org.store, first).await.unwrap();
    assert_eq!(sum(account(&org.store, org.employee, org.casual, YEAR).await), dec!(10));
    assert_eq!(account(&org.store, org.employee, org.casual, YEAR).await, (dec!(7), dec!(3)));
}

/// Requesting more days than remain fails and persists nothing.
#[actix_web::test]
async fn limit_exceeded_when_balance_is_short() {
    let org = setup().await;

    // Burn the balance down to 2.
    ledger::apply_delta(&org.store, org.employee, org.casual, YEAR, dec!(-8), dec!(8))
        .await
        .unwrap();

    let err = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(3, 1), d(3, 3), 3),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LeaveError::LimitExceeded));
    assert!(lifecycle::history(&org.store, org.employee).await.unwrap().is_empty());
    assert_eq!(account(&org.store, org.employee, org.casual, YEAR).await, (dec!(2), dec!(8)));
}

/// A request whose year has no provisioned row is a data gap, reported
/// distinctly from the limit check.
#[actix_web::test]
async fn missing_balance_row_is_balance_not_found() {
    let org = setup().await;

    let start = chrono::NaiveDate::from_ymd_opt(YEAR + 1, 1, 10).unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(YEAR + 1, 1, 11).unwrap();
    let err = lifecycle::submit(&org.store, leave(org.employee, org.casual, start, end, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::BalanceNotFound));
}

#[actix_web::test]
async fn delta_on_missing_row_is_balance_not_found() {
    let org = setup().await;
    let err = ledger::apply_delta(&org.store, org.employee, org.casual, 1999, dec!(-1), dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::BalanceNotFound));
}

/// Exempt types ignore the balance side of any delta; usage still moves.
#[actix_web::test]
async fn exempt_type_never_spends_its_balance() {
    let org = setup().await;

    ledger::apply_delta(
        &org.store,
        org.employee,
        org.loss_of_pay,
        YEAR,
        dec!(-5),
        dec!(5),
    )
    .await
    .unwrap();
    assert_eq!(
        account(&org.store, org.employee, org.loss_of_pay, YEAR).await,
        (dec!(20), dec!(5))
    );

    // Exempt types are also outside the submission limit check: the used
    // figure may grow past the nominal balance.
    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.loss_of_pay, d(4, 1), d(4, 4), 4),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();
    assert_eq!(
        account(&org.store, org.employee, org.loss_of_pay, YEAR).await,
        (dec!(20), dec!(9))
    );
}

/// Balance summary excludes exempt types from the totals while still
/// listing them.
#[actix_web::test]
async fn summary_totals_skip_exempt_types() {
    let org = setup().await;

    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 1), d(2, 4), 4),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();

    let emergency = lifecycle::submit(
        &org.store,
        leave(org.employee, org.emergency, d(7, 1), d(7, 2), 2),
    )
    .await
    .unwrap();
    // Auto-approved at submission already.
    let req = org.store.get_request(emergency).await.unwrap().unwrap();
    assert_eq!(req.status, leave_engine::model::leave_request::LeaveStatus::Approved);

    let summary = ledger::summary(&org.store, org.employee, YEAR).await.unwrap();
    // Non-exempt: casual 10 + sick 14 + paid 16 + maternity 20 + paternity 20 = 80
    assert_eq!(summary.total_leaves, dec!(80));
    assert_eq!(summary.total_balance, dec!(76));
    assert_eq!(summary.details.len(), 7);

    let emergency_row = summary
        .details
        .iter()
        .find(|e| e.leave_type == "Emergency Leave")
        .unwrap();
    assert_eq!(emergency_row.balance, dec!(15));
    assert_eq!(emergency_row.used, dec!(2));
}

/// Provisioning is create-if-absent; re-running never resets an account.
#[actix_web::test]
async fn provisioning_keeps_existing_rows() {
    let org = setup().await;

    ledger::apply_delta(&org.store, org.employee, org.casual, YEAR, dec!(-4), dec!(4))
        .await
        .unwrap();
    ledger::provision_for_user(&org.store, org.employee, YEAR)
        .await
        .unwrap();
    assert_eq!(account(&org.store, org.employee, org.casual, YEAR).await, (dec!(6), dec!(4)));
}
