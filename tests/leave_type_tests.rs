mod common;

use common::{account, d, leave, setup, YEAR};
use rust_decimal::dec;

use leave_engine::leave::{LeaveError, ledger, lifecycle, types};
use leave_engine::store::{LeaveStore, NewLeaveType};

fn sabbatical() -> NewLeaveType {
    NewLeaveType {
        name: "Sabbatical".to_string(),
        max_per_year: dec!(30),
        multi_approver: 3,
        auto_approve: false,
        is_exempt: false,
        carry_forward: false,
    }
}

/// Creating a type provisions a full-allowance row for every active user.
#[actix_web::test]
async fn creation_provisions_every_active_user() {
    let org = setup().await;

    let id = types::add(&org.store, sabbatical(), YEAR).await.unwrap();

    for user in [org.admin, org.hr, org.manager, org.employee] {
        assert_eq!(account(&org.store, user, id, YEAR).await, (dec!(30), dec!(0)));
    }

    let listed = types::list(&org.store).await.unwrap();
    assert_eq!(listed.len(), 8);
    assert!(listed.iter().any(|t| t.name == "Sabbatical"));
}

/// Soft-deleting a type takes its requests with it and drops it from
/// balance summaries; the rows themselves are never physically removed.
#[actix_web::test]
async fn deletion_cascades_to_requests_and_summaries() {
    let org = setup().await;

    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(3, 1), d(3, 2), 2),
    )
    .await
    .unwrap();

    types::delete(&org.store, org.casual).await.unwrap();

    assert!(org.store.get_request(id).await.unwrap().is_none());
    assert!(lifecycle::history(&org.store, org.employee).await.unwrap().is_empty());

    let summary = ledger::summary(&org.store, org.employee, YEAR).await.unwrap();
    assert!(summary.details.iter().all(|e| e.leave_type != "Casual Leave"));

    // The freed dates no longer conflict.
    lifecycle::submit(&org.store, leave(org.employee, org.sick, d(3, 1), d(3, 2), 2))
        .await
        .unwrap();
}

#[actix_web::test]
async fn update_of_missing_type_is_not_found() {
    let org = setup().await;
    let err = types::update(&org.store, 999, "Ghost", dec!(5), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));

    let err = types::delete(&org.store, 999).await.unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}
