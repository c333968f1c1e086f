//! The leave-request lifecycle engine.
//!
//! `lifecycle` owns the request state machine; `hierarchy` resolves the
//! approval chain; `ledger` applies balance deltas; `conflict` detects
//! date overlap; `carry_forward` rolls unused balances into the new year.

pub mod carry_forward;
pub mod conflict;
pub mod hierarchy;
pub mod ledger;
pub mod lifecycle;
pub mod types;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A balance row that provisioning should have created is absent.
    /// Distinct from [`LeaveError::LimitExceeded`]: this is a data gap,
    /// not policy.
    #[error("leave balance not found")]
    BalanceNotFound,
    #[error("leave limit exceeded")]
    LimitExceeded,
    #[error("leave dates overlap with existing requests")]
    OverlapConflict,
    #[error("{0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overlap => LeaveError::OverlapConflict,
            StoreError::BalanceMissing { .. } => LeaveError::BalanceNotFound,
            StoreError::NotFound => LeaveError::NotFound("record"),
            other => LeaveError::Store(other),
        }
    }
}
