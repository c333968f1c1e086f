mod common;

use common::setup;

use leave_engine::leave::{LeaveError, hierarchy};
use leave_engine::store::{LeaveStore, StoreError};

/// Employee -> manager -> hr -> admin resolves all three levels.
#[actix_web::test]
async fn full_chain_resolves_three_levels() {
    let org = setup().await;

    let (user, chain) = hierarchy::resolve_chain(&org.store, org.employee).await.unwrap();
    assert_eq!(user.id, org.employee);
    assert_eq!(chain.manager_id, Some(org.manager));
    assert_eq!(chain.level2_approver_id, Some(org.hr));
    assert_eq!(chain.level3_approver_id, Some(org.admin));
}

/// The chain terminates where the manager links run out; missing hops are
/// not errors.
#[actix_web::test]
async fn chain_truncates_at_the_root() {
    let org = setup().await;

    let (_, chain) = hierarchy::resolve_chain(&org.store, org.manager).await.unwrap();
    assert_eq!(chain.manager_id, Some(org.hr));
    assert_eq!(chain.level2_approver_id, Some(org.admin));
    assert_eq!(chain.level3_approver_id, None);

    let (_, chain) = hierarchy::resolve_chain(&org.store, org.admin).await.unwrap();
    assert_eq!(chain.manager_id, None);
    assert_eq!(chain.level2_approver_id, None);
    assert_eq!(chain.level3_approver_id, None);
}

/// A soft-deleted manager breaks the link for that hop and everything
/// deeper.
#[actix_web::test]
async fn deleted_manager_truncates_the_chain() {
    let org = setup().await;
    org.store.remove_user(org.manager);

    let (_, chain) = hierarchy::resolve_chain(&org.store, org.employee).await.unwrap();
    assert_eq!(chain.manager_id, None);
    assert_eq!(chain.level2_approver_id, None);
    assert_eq!(chain.level3_approver_id, None);
}

#[actix_web::test]
async fn missing_user_is_not_found() {
    let org = setup().await;
    let err = hierarchy::resolve_chain(&org.store, 999).await.unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

/// Directory lookups by email resolve active users only.
#[actix_web::test]
async fn email_lookup_skips_deleted_users() {
    let org = setup().await;

    let user = org
        .store
        .get_user_by_email("eli@corp.test")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, org.employee);

    org.store.remove_user(org.employee);
    assert!(org
        .store
        .get_user_by_email("eli@corp.test")
        .await
        .unwrap()
        .is_none());
}

/// Reassignment walks the chain and refuses to close a loop.
#[actix_web::test]
async fn manager_reassignment_rejects_cycles() {
    let org = setup().await;

    // admin currently tops the employee's chain; reporting to the employee
    // would make the forest cyclic.
    let err = org
        .store
        .assign_manager(org.admin, Some(org.employee))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ManagerCycle));

    let err = org
        .store
        .assign_manager(org.manager, Some(org.manager))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ManagerCycle));

    // A legal reassignment still works: employee reports to HR directly.
    org.store
        .assign_manager(org.employee, Some(org.hr))
        .await
        .unwrap();
    let (_, chain) = hierarchy::resolve_chain(&org.store, org.employee).await.unwrap();
    assert_eq!(chain.manager_id, Some(org.hr));
    assert_eq!(chain.level2_approver_id, Some(org.admin));
    assert_eq!(chain.level3_approver_id, None);
}
