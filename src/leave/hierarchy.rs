//! Approval-chain resolution over the manager forest.

use serde::Serialize;

use crate::model::user::{Role, User};
use crate::store::LeaveStore;

use super::LeaveError;

/// Approvers resolved for a requester, one per level. A `None` at any
/// level means the chain terminates there (the hop's manager link is
/// missing or the user reports to a root admin); deeper levels are `None`
/// as well.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ApprovalChain {
    pub manager_id: Option<u64>,
    pub level2_approver_id: Option<u64>,
    pub level3_approver_id: Option<u64>,
}

/// Organizational ceiling on approval depth, independent of the leave
/// type: an employee's request can climb three levels, a manager's two,
/// everyone else answers to a single approver.
pub fn max_approval_depth(role: Role) -> u8 {
    match role {
        Role::Employee => 3,
        Role::Manager => 2,
        Role::Hr | Role::Admin => 1,
    }
}

/// Walks the manager relation up to two hops past the direct manager.
/// Fails with NotFound when the requester is missing or soft-deleted;
/// missing links along the way are not an error.
pub async fn resolve_chain<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
) -> Result<(User, ApprovalChain), LeaveError> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or(LeaveError::NotFound("user"))?;

    let manager = match user.manager_id {
        Some(id) => store.get_user(id).await?,
        None => None,
    };
    let level2 = match manager.as_ref().and_then(|m| m.manager_id) {
        Some(id) => store.get_user(id).await?,
        None => None,
    };
    let level3 = match level2.as_ref().and_then(|m| m.manager_id) {
        Some(id) => store.get_user(id).await?,
        None => None,
    };

    let chain = ApprovalChain {
        manager_id: manager.map(|m| m.id),
        level2_approver_id: level2.map(|m| m.id),
        level3_approver_id: level3.map(|m| m.id),
    };
    Ok((user, chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_ceiling_by_role() {
        assert_eq!(max_approval_depth(Role::Employee), 3);
        assert_eq!(max_approval_depth(Role::Manager), 2);
        assert_eq!(max_approval_depth(Role::Hr), 1);
        assert_eq!(max_approval_depth(Role::Admin), 1);
    }
}
