//! Leave-type administration.

use rust_decimal::Decimal;
use tracing::info;

use crate::model::leave_type::LeaveType;
use crate::store::{LeaveStore, NewLeaveType};

use super::LeaveError;

pub async fn list<S: LeaveStore + ?Sized>(store: &S) -> Result<Vec<LeaveType>, LeaveError> {
    Ok(store.list_leave_types().await?)
}

/// Creates a leave type and provisions the given year's balance row for
/// every active user, each seeded with the full annual allowance.
pub async fn add<S: LeaveStore + ?Sized>(
    store: &S,
    new_type: NewLeaveType,
    year: i32,
) -> Result<u64, LeaveError> {
    let allowance = new_type.max_per_year;
    let leave_type_id = store.insert_leave_type(new_type).await?;
    for user in store.all_active_users().await? {
        store
            .init_balance(user.id, leave_type_id, year, allowance)
            .await?;
    }
    info!(leave_type_id, year, "leave type created and provisioned");
    Ok(leave_type_id)
}

pub async fn update<S: LeaveStore + ?Sized>(
    store: &S,
    id: u64,
    name: &str,
    max_per_year: Decimal,
    multi_approver: u8,
) -> Result<(), LeaveError> {
    if store
        .update_leave_type(id, name, max_per_year, multi_approver)
        .await?
    {
        Ok(())
    } else {
        Err(LeaveError::NotFound("leave type"))
    }
}

/// Soft-deletes the type; its leave requests are soft-deleted with it.
pub async fn delete<S: LeaveStore + ?Sized>(store: &S, id: u64) -> Result<(), LeaveError> {
    if store.soft_delete_leave_type(id).await? {
        info!(leave_type_id = id, "leave type deleted");
        Ok(())
    } else {
        Err(LeaveError::NotFound("leave type"))
    }
}
