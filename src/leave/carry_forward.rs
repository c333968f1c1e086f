//! Annual carry-forward of unused balances.
//!
//! Runs as a single periodic task. For every carry-eligible leave type it
//! rolls each user's positive prior-year balance into a fresh current-year
//! row, capped at the type's annual allowance. Existing current-year rows
//! are never touched, which makes the job idempotent and safe to re-run.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::store::LeaveStore;

use super::LeaveError;

#[derive(Debug, Default, Serialize)]
pub struct CarryForwardReport {
    pub created: u32,
    pub skipped: u32,
}

pub async fn run<S: LeaveStore + ?Sized>(
    store: &S,
    current_year: i32,
) -> Result<CarryForwardReport, LeaveError> {
    let previous_year = current_year - 1;
    let mut report = CarryForwardReport::default();

    for leave_type in store.list_leave_types().await? {
        if leave_type.is_exempt || !leave_type.carry_forward {
            continue;
        }
        for prior in store
            .balances_for_type_year(leave_type.id, previous_year)
            .await?
        {
            if prior.balance <= Decimal::ZERO {
                continue;
            }
            let carry = prior.balance.min(leave_type.max_per_year);
            let created = store
                .init_balance(prior.user_id, leave_type.id, current_year, carry)
                .await?;
            if created {
                report.created += 1;
            } else {
                debug!(
                    user_id = prior.user_id,
                    leave_type_id = leave_type.id,
                    current_year,
                    "current-year balance row exists, skipping"
                );
                report.skipped += 1;
            }
        }
    }

    info!(
        current_year,
        created = report.created,
        skipped = report.skipped,
        "carry-forward completed"
    );
    Ok(report)
}
