mod common;

use common::{d, leave, setup};
use rust_decimal::dec;

use leave_engine::leave::{LeaveError, conflict, lifecycle};
use leave_engine::model::leave_request::LeaveStatus;
use leave_engine::store::{LeaveStore, NewLeaveRequest, StoreError};

/// A second request over intersecting dates is a hard submission failure.
#[actix_web::test]
async fn overlapping_submission_is_rejected() {
    let org = setup().await;

    lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(1, 1), d(1, 5), 5),
    )
    .await
    .unwrap();

    let err = lifecycle::submit(
        &org.store,
        leave(org.employee, org.sick, d(1, 3), d(1, 10), 8),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LeaveError::OverlapConflict));
    assert_eq!(lifecycle::history(&org.store, org.employee).await.unwrap().len(), 1);
}

/// Inclusive ranges: sharing a single calendar day is already a conflict.
#[actix_web::test]
async fn shared_boundary_day_conflicts() {
    let org = setup().await;

    lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 1), d(2, 5), 5),
    )
    .await
    .unwrap();

    let err = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 5), d(2, 6), 2),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LeaveError::OverlapConflict));

    // The day after the range ends is fine.
    lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(2, 6), d(2, 7), 2),
    )
    .await
    .unwrap();
}

/// Approved requests block; rejected and cancelled ones never do.
#[actix_web::test]
async fn terminal_rejections_and_cancellations_free_the_dates() {
    let org = setup().await;

    let blocked = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(3, 1), d(3, 3), 3),
    )
    .await
    .unwrap();
    lifecycle::reject(&org.store, blocked).await.unwrap();

    // Same dates are available again after rejection.
    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(3, 1), d(3, 3), 3),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();

    // Approved leave still blocks.
    assert!(conflict::has_overlap(&org.store, org.employee, d(3, 3), d(3, 4))
        .await
        .unwrap());

    lifecycle::cancel(&org.store, id).await.unwrap();
    assert!(!conflict::has_overlap(&org.store, org.employee, d(3, 3), d(3, 4))
        .await
        .unwrap());
}

/// A request escalated to the third level still occupies its dates.
#[actix_web::test]
async fn third_level_pending_request_blocks_overlap() {
    let org = setup().await;

    let id = lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(6, 1), d(6, 7), 7),
    )
    .await
    .unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();
    lifecycle::approve(&org.store, id).await.unwrap();
    let req = org.store.get_request(id).await.unwrap().unwrap();
    assert_eq!(req.status, LeaveStatus::PendingL3);

    assert!(conflict::has_overlap(&org.store, org.employee, d(6, 7), d(6, 9))
        .await
        .unwrap());
}

#[actix_web::test]
async fn different_users_do_not_conflict() {
    let org = setup().await;

    lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(4, 1), d(4, 5), 5),
    )
    .await
    .unwrap();
    lifecycle::submit(
        &org.store,
        leave(org.manager, org.casual, d(4, 1), d(4, 5), 5),
    )
    .await
    .unwrap();
}

/// The insert itself re-checks overlap in its critical section, so a
/// submission racing past the early check still cannot land twice.
#[actix_web::test]
async fn guarded_insert_rejects_overlap_at_write_time() {
    let org = setup().await;

    lifecycle::submit(
        &org.store,
        leave(org.employee, org.casual, d(5, 1), d(5, 5), 5),
    )
    .await
    .unwrap();

    let err = org
        .store
        .insert_request(NewLeaveRequest {
            user_id: org.employee,
            leave_type_id: org.sick,
            start_date: d(5, 4),
            end_date: d(5, 6),
            is_half_day: false,
            half_day_type: None,
            reason: "race".to_string(),
            status: LeaveStatus::Pending,
            final_approval_level: 1,
            total_days: dec!(3),
            level2_approver_id: None,
            level3_approver_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Overlap));
}
