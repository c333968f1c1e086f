//! The approval state machine.
//!
//! Owns every status transition of a leave request. Transitions go through
//! the store's compare-and-swap so concurrent approvers serialize: exactly
//! one caller wins a given transition, the loser sees the already-updated
//! status and reports "already processed" instead of failing. The ledger
//! is touched exactly once per request lifetime at finalization, and once
//! more only if an approved request is later cancelled.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;

use crate::model::{
    leave_request::{HalfDayType, LeaveRequest, LeaveRequestView, LeaveStatus, Transition},
    user::Role,
};
use crate::store::{LeaveStore, NewLeaveRequest};

use super::{LeaveError, conflict, hierarchy, ledger};

/// Requests of five days or more always demand the full depth the
/// requester's role permits, regardless of the leave type's configuration.
const LARGE_REQUEST_DAYS: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub user_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub reason: String,
    pub total_days: Decimal,
}

/// What an approve/reject/cancel action did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ActionOutcome {
    /// Moved to the next pending level.
    Advanced(LeaveStatus),
    Approved,
    Rejected,
    Cancelled,
    /// The request was already in a terminal state, or a concurrent
    /// caller won the transition first. Informational, not an error.
    AlreadyProcessed,
}

impl ActionOutcome {
    pub fn next_step(&self) -> &'static str {
        match self {
            ActionOutcome::Advanced(LeaveStatus::PendingL2) => "Approved (L2)",
            ActionOutcome::Advanced(LeaveStatus::PendingL3) => "Approved (L3)",
            ActionOutcome::Advanced(_) => "Advanced",
            ActionOutcome::Approved => "Approved",
            ActionOutcome::Rejected => "Rejected",
            ActionOutcome::Cancelled => "Cancelled",
            ActionOutcome::AlreadyProcessed => "Leave already processed",
        }
    }
}

fn validate(input: &SubmitLeave) -> Result<(), LeaveError> {
    if input.start_date > input.end_date {
        return Err(LeaveError::Validation(
            "start_date cannot be after end_date".to_string(),
        ));
    }
    if input.total_days <= Decimal::ZERO {
        return Err(LeaveError::Validation(
            "total_days must be positive".to_string(),
        ));
    }
    if input.is_half_day && input.half_day_type.is_none() {
        return Err(LeaveError::Validation(
            "half_day_type is required for half-day leave".to_string(),
        ));
    }
    Ok(())
}

/// Validates and persists a new request, returning its id.
///
/// Nothing is persisted unless every check passes; a failed submission
/// leaves no partial state behind. For auto-approved leave types the
/// request is born `Approved` and the ledger is debited as part of
/// submission, bypassing the approval flow.
pub async fn submit<S: LeaveStore + ?Sized>(
    store: &S,
    input: SubmitLeave,
) -> Result<u64, LeaveError> {
    validate(&input)?;

    let leave_type = store
        .get_leave_type(input.leave_type_id)
        .await?
        .ok_or(LeaveError::NotFound("leave type"))?;
    let year = input.start_date.year();

    if !leave_type.is_exempt {
        let balance = store
            .get_balance(input.user_id, input.leave_type_id, year)
            .await?
            .ok_or(LeaveError::BalanceNotFound)?;
        if input.total_days > balance.balance {
            return Err(LeaveError::LimitExceeded);
        }
    }

    if conflict::has_overlap(store, input.user_id, input.start_date, input.end_date).await? {
        return Err(LeaveError::OverlapConflict);
    }

    let (user, chain) = hierarchy::resolve_chain(store, input.user_id).await?;
    let ceiling = hierarchy::max_approval_depth(user.role);
    let final_level = if input.total_days >= LARGE_REQUEST_DAYS {
        ceiling
    } else {
        // A multi_approver of zero still means one level.
        leave_type.multi_approver.max(1).min(ceiling)
    };

    let status = if leave_type.auto_approve {
        LeaveStatus::Approved
    } else if final_level > 1 {
        LeaveStatus::PendingL1
    } else {
        LeaveStatus::Pending
    };

    let request_id = store
        .insert_request(NewLeaveRequest {
            user_id: input.user_id,
            leave_type_id: input.leave_type_id,
            start_date: input.start_date,
            end_date: input.end_date,
            is_half_day: input.is_half_day,
            half_day_type: input.half_day_type,
            reason: input.reason,
            status,
            final_approval_level: final_level,
            total_days: input.total_days,
            level2_approver_id: chain.level2_approver_id,
            level3_approver_id: chain.level3_approver_id,
        })
        .await?;

    if leave_type.auto_approve {
        ledger::apply_delta(
            store,
            input.user_id,
            input.leave_type_id,
            year,
            -input.total_days,
            input.total_days,
        )
        .await?;
    }

    info!(
        request_id,
        user_id = input.user_id,
        leave_type_id = input.leave_type_id,
        %status,
        final_level,
        "leave request submitted"
    );
    Ok(request_id)
}

async fn finalize<S: LeaveStore + ?Sized>(
    store: &S,
    request: &LeaveRequest,
) -> Result<ActionOutcome, LeaveError> {
    if !store
        .update_status_if(request.id, request.status, LeaveStatus::Approved)
        .await?
    {
        return Ok(ActionOutcome::AlreadyProcessed);
    }
    ledger::debit_for_approval(store, request).await?;
    info!(request_id = request.id, user_id = request.user_id, "leave request approved");
    Ok(ActionOutcome::Approved)
}

/// Advances a request one approval level, finalizing at the last one.
pub async fn approve<S: LeaveStore + ?Sized>(
    store: &S,
    request_id: u64,
) -> Result<ActionOutcome, LeaveError> {
    let request = store
        .get_request(request_id)
        .await?
        .ok_or(LeaveError::NotFound("leave request"))?;
    let leave_type = store
        .get_leave_type(request.leave_type_id)
        .await?
        .ok_or(LeaveError::NotFound("leave type"))?;

    // A request of an auto-approved type that is not yet approved was
    // submitted before the type's policy changed; finalize it directly.
    if leave_type.auto_approve && request.status != LeaveStatus::Approved {
        return finalize(store, &request).await;
    }

    match request.status.on_approve(request.final_approval_level) {
        Transition::Finalize => finalize(store, &request).await,
        Transition::Advance(next) => {
            if store
                .update_status_if(request.id, request.status, next)
                .await?
            {
                info!(request_id, next_status = %next, "leave request advanced");
                Ok(ActionOutcome::Advanced(next))
            } else {
                Ok(ActionOutcome::AlreadyProcessed)
            }
        }
        Transition::AlreadyProcessed => Ok(ActionOutcome::AlreadyProcessed),
    }
}

/// Rejects a pending request. No ledger effect: nothing is debited before
/// final approval.
pub async fn reject<S: LeaveStore + ?Sized>(
    store: &S,
    request_id: u64,
) -> Result<ActionOutcome, LeaveError> {
    let request = store
        .get_request(request_id)
        .await?
        .ok_or(LeaveError::NotFound("leave request"))?;

    if request.status.is_terminal() {
        return Ok(ActionOutcome::AlreadyProcessed);
    }
    if store
        .update_status_if(request.id, request.status, LeaveStatus::Rejected)
        .await?
    {
        info!(request_id, "leave request rejected");
        Ok(ActionOutcome::Rejected)
    } else {
        Ok(ActionOutcome::AlreadyProcessed)
    }
}

/// Cancels a request in any state. Cancelling a previously approved
/// request credits the debit back against the leave's start-date year.
pub async fn cancel<S: LeaveStore + ?Sized>(
    store: &S,
    request_id: u64,
) -> Result<ActionOutcome, LeaveError> {
    let request = store
        .get_request(request_id)
        .await?
        .ok_or(LeaveError::NotFound("leave request"))?;

    if request.status == LeaveStatus::Cancelled {
        return Ok(ActionOutcome::AlreadyProcessed);
    }
    if !store
        .update_status_if(request.id, request.status, LeaveStatus::Cancelled)
        .await?
    {
        return Ok(ActionOutcome::AlreadyProcessed);
    }
    if request.status == LeaveStatus::Approved {
        ledger::credit_for_cancellation(store, &request).await?;
    }
    info!(request_id, was = %request.status, "leave request cancelled");
    Ok(ActionOutcome::Cancelled)
}

/// A user's request history, most recent first.
pub async fn history<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
) -> Result<Vec<LeaveRequestView>, LeaveError> {
    Ok(store.history_for_user(user_id).await?)
}

/// Requests awaiting the given approver, filtered by their role.
pub async fn incoming_requests<S: LeaveStore + ?Sized>(
    store: &S,
    approver_id: u64,
) -> Result<Vec<LeaveRequestView>, LeaveError> {
    let approver = store
        .get_user(approver_id)
        .await?
        .ok_or(LeaveError::NotFound("user"))?;
    Ok(store.incoming_for_approver(&approver).await?)
}

/// Everyone on approved leave on the given day.
pub async fn users_on_leave<S: LeaveStore + ?Sized>(
    store: &S,
    day: NaiveDate,
) -> Result<Vec<crate::model::leave_request::OnLeaveToday>, LeaveError> {
    Ok(store.on_leave_today(day).await?)
}

/// Approved leave for a set of team members in one month; admins see the
/// whole organization.
pub async fn team_leave<S: LeaveStore + ?Sized>(
    store: &S,
    user_ids: &[u64],
    month: u32,
    year: i32,
    role: Role,
) -> Result<Vec<LeaveRequestView>, LeaveError> {
    Ok(store.team_leave(user_ids, month, year, role).await?)
}
