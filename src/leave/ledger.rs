//! Balance accounting.
//!
//! The ledger is the only writer of balance rows. Approval of N days
//! applies `used += N, balance -= N`; cancellation of a previously
//! approved request applies the exact negation, so `balance + used` is
//! conserved across any approve/cancel sequence. Exempt leave types have
//! their balance delta forced to zero: usage is still tracked for
//! reporting but the nominal balance never moves.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::model::{leave_balance::BalanceEntry, leave_request::LeaveRequest};
use crate::store::LeaveStore;

use super::LeaveError;

/// Applies a signed delta to the (user, leave type, year) account.
/// A missing row signals a provisioning gap, surfaced as
/// [`LeaveError::BalanceNotFound`].
pub async fn apply_delta<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
    balance_delta: Decimal,
    used_delta: Decimal,
) -> Result<(), LeaveError> {
    let leave_type = store
        .get_leave_type(leave_type_id)
        .await?
        .ok_or(LeaveError::NotFound("leave type"))?;

    let balance_delta = if leave_type.is_exempt {
        Decimal::ZERO
    } else {
        balance_delta
    };

    store
        .apply_balance_delta(user_id, leave_type_id, year, balance_delta, used_delta)
        .await?;
    debug!(
        user_id,
        leave_type_id,
        year,
        %balance_delta,
        %used_delta,
        "applied balance delta"
    );
    Ok(())
}

/// Finalization debit: consumes `total_days` against the start-date year.
pub async fn debit_for_approval<S: LeaveStore + ?Sized>(
    store: &S,
    request: &LeaveRequest,
) -> Result<(), LeaveError> {
    apply_delta(
        store,
        request.user_id,
        request.leave_type_id,
        request.start_date.year(),
        -request.total_days,
        request.total_days,
    )
    .await
}

/// Reversal credit for cancelling an approved request: the exact negation
/// of the finalization debit.
pub async fn credit_for_cancellation<S: LeaveStore + ?Sized>(
    store: &S,
    request: &LeaveRequest,
) -> Result<(), LeaveError> {
    apply_delta(
        store,
        request.user_id,
        request.leave_type_id,
        request.start_date.year(),
        request.total_days,
        -request.total_days,
    )
    .await
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceSummary {
    /// Remaining days across non-exempt types.
    #[schema(example = 27.5, value_type = f64)]
    pub total_balance: Decimal,
    /// Total entitlement across non-exempt types.
    #[schema(example = 40.0, value_type = f64)]
    pub total_leaves: Decimal,
    pub details: Vec<BalanceEntry>,
}

/// Per-type balances for a user/year with organization-wide totals.
/// Exempt types appear in the details but stay out of the totals.
pub async fn summary<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
    year: i32,
) -> Result<BalanceSummary, LeaveError> {
    let details = store.balances_for_user_year(user_id, year).await?;
    let mut total_balance = Decimal::ZERO;
    let mut total_leaves = Decimal::ZERO;
    for entry in &details {
        if !entry.is_exempt {
            total_balance += entry.balance;
            total_leaves += entry.total;
        }
    }
    Ok(BalanceSummary {
        total_balance,
        total_leaves,
        details,
    })
}

/// Provisions the year's balance rows for one user across all active
/// leave types. Called by the directory when a user is created; safe to
/// re-run, existing rows are kept.
pub async fn provision_for_user<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
    year: i32,
) -> Result<(), LeaveError> {
    for leave_type in store.list_leave_types().await? {
        let created = store
            .init_balance(user_id, leave_type.id, year, leave_type.max_per_year)
            .await?;
        if created {
            info!(user_id, leave_type_id = leave_type.id, year, "provisioned balance row");
        }
    }
    Ok(())
}
