mod common;

use common::{account, d, leave, setup, YEAR};
use rust_decimal::dec;

use leave_engine::leave::{carry_forward, ledger, lifecycle, types};
use leave_engine::store::LeaveStore;

/// Unused prior-year balance rolls into a fresh current-year row; exempt
/// and non-carrying types stay behind.
#[actix_web::test]
async fn rolls_positive_balances_into_the_new_year() {
    let org = setup().await;

    // Employee spends four casual days in the prior year.
    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 1), d(2, 4), 4),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();

    let report = carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    // Casual + Sick + Paid carry for all four users.
    assert_eq!(report.created, 12);
    assert_eq!(report.skipped, 0);

    assert_eq!(
        account(&org.store, org.employee, org.casual, YEAR + 1).await,
        (dec!(6), dec!(0))
    );
    assert_eq!(
        account(&org.store, org.manager, org.casual, YEAR + 1).await,
        (dec!(10), dec!(0))
    );

    // No carry for Maternity (flagged off) or the exempt types.
    for leave_type in [org.maternity, org.emergency, org.loss_of_pay] {
        assert!(org
            .store
            .get_balance(org.employee, leave_type, YEAR + 1)
            .await
            .unwrap()
            .is_none());
    }
}

/// Running the job twice creates each row exactly once.
#[actix_web::test]
async fn rerun_is_idempotent() {
    let org = setup().await;

    let first = carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    assert_eq!(first.created, 12);

    let second = carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 12);
    assert_eq!(
        account(&org.store, org.employee, org.casual, YEAR + 1).await,
        (dec!(10), dec!(0))
    );
}

/// Carried balance is capped at the type's annual allowance.
#[actix_web::test]
async fn carry_is_capped_at_max_per_year() {
    let org = setup().await;

    // Policy change shrinks the allowance below the remaining balance.
    types::update(&org.store, org.casual, "Casual Leave", dec!(6), 1)
        .await
        .unwrap();

    carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    assert_eq!(
        account(&org.store, org.employee, org.casual, YEAR + 1).await,
        (dec!(6), dec!(0))
    );
}

/// Fully spent accounts do not produce a new-year row.
#[actix_web::test]
async fn zero_balances_are_not_carried() {
    let org = setup().await;

    ledger::apply_delta(&org.store, org.employee, org.casual, YEAR, dec!(-10), dec!(10))
        .await
        .unwrap();

    carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    assert!(org
        .store
        .get_balance(org.employee, org.casual, YEAR + 1)
        .await
        .unwrap()
        .is_none());
    // Everyone else's row still carries.
    assert_eq!(
        account(&org.store, org.manager, org.casual, YEAR + 1).await,
        (dec!(10), dec!(0))
    );
}

/// An existing current-year row is never overwritten.
#[actix_web::test]
async fn existing_rows_are_preserved() {
    let org = setup().await;

    org.store
        .init_balance(org.employee, org.casual, YEAR + 1, dec!(3))
        .await
        .unwrap();

    let report = carry_forward::run(&org.store, YEAR + 1).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(
        account(&org.store, org.employee, org.casual, YEAR + 1).await,
        (dec!(3), dec!(0))
    );
}
