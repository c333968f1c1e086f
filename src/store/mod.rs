//! Storage seam for the leave engine.
//!
//! The engine core is written against [`LeaveStore`]; the MySQL
//! implementation backs the running service and an in-memory one backs the
//! test suites. Every read-modify-write a caller can race on (status
//! transitions, balance deltas, the overlap-guarded insert) is a single
//! critical section inside the store, so the engine never has to lock.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{
    leave_balance::{BalanceEntry, LeaveBalance},
    leave_request::{LeaveRequest, LeaveRequestView, LeaveStatus, OnLeaveToday},
    leave_type::LeaveType,
    user::{Role, User},
};

pub mod memory;
pub mod mysql;
pub mod seed;

pub use memory::MemStore;
pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("balance row missing for user {user_id}, leave type {leave_type_id}, year {year}")]
    BalanceMissing {
        user_id: u64,
        leave_type_id: u64,
        year: i32,
    },
    #[error("dates overlap an existing request")]
    Overlap,
    #[error("manager assignment would create a reporting cycle")]
    ManagerCycle,
    #[error("invalid stored value: {0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert payload for a leave request; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub user_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<crate::model::leave_request::HalfDayType>,
    pub reason: String,
    pub status: LeaveStatus,
    pub final_approval_level: u8,
    pub total_days: Decimal,
    pub level2_approver_id: Option<u64>,
    pub level3_approver_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct NewLeaveType {
    pub name: String,
    pub max_per_year: Decimal,
    pub multi_approver: u8,
    pub auto_approve: bool,
    pub is_exempt: bool,
    pub carry_forward: bool,
}

/// Persistence operations the engine needs. All getters exclude
/// soft-deleted rows (the [`crate::model::Active`] predicate).
#[async_trait]
pub trait LeaveStore: Send + Sync {
    // --- user directory ---

    async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn all_active_users(&self) -> Result<Vec<User>, StoreError>;
    /// Repoint a user's manager link. Fails with [`StoreError::ManagerCycle`]
    /// when the new link would make the user (transitively) manage themself.
    async fn assign_manager(&self, user_id: u64, manager_id: Option<u64>)
        -> Result<(), StoreError>;

    // --- leave types ---

    async fn get_leave_type(&self, id: u64) -> Result<Option<LeaveType>, StoreError>;
    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, StoreError>;
    async fn insert_leave_type(&self, new_type: NewLeaveType) -> Result<u64, StoreError>;
    /// Returns false when no active row matched.
    async fn update_leave_type(
        &self,
        id: u64,
        name: &str,
        max_per_year: Decimal,
        multi_approver: u8,
    ) -> Result<bool, StoreError>;
    /// Soft-deletes the type and cascades soft-delete to its requests.
    async fn soft_delete_leave_type(&self, id: u64) -> Result<bool, StoreError>;

    // --- balances ---

    async fn get_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, StoreError>;
    /// All of a user's rows for a year, joined with the leave type.
    async fn balances_for_user_year(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<Vec<BalanceEntry>, StoreError>;
    /// Every user's row for one type and year (carry-forward scan).
    async fn balances_for_type_year(
        &self,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError>;
    /// Create the row if absent; returns whether a row was created. Never
    /// overwrites an existing row.
    async fn init_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance: Decimal,
    ) -> Result<bool, StoreError>;
    /// Atomically applies `balance += balance_delta; used += used_delta`.
    /// A missing row is [`StoreError::BalanceMissing`], not an upsert.
    async fn apply_balance_delta(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance_delta: Decimal,
        used_delta: Decimal,
    ) -> Result<(), StoreError>;

    // --- leave requests ---

    async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;
    /// Closed-interval overlap against the user's pending/approved requests.
    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError>;
    /// Inserts a request, re-checking overlap inside the same critical
    /// section so two racing submissions cannot both pass.
    async fn insert_request(&self, req: NewLeaveRequest) -> Result<u64, StoreError>;
    /// Compare-and-swap on status: the update applies only when the current
    /// status equals `expected`, and stamps `status_updated_at`. Returns
    /// whether this caller won the transition.
    async fn update_status_if(
        &self,
        id: u64,
        expected: LeaveStatus,
        next: LeaveStatus,
    ) -> Result<bool, StoreError>;
    /// A user's requests, most recent first.
    async fn history_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequestView>, StoreError>;
    /// Requests awaiting this approver, filtered by their role and the
    /// chain captured on each request.
    async fn incoming_for_approver(
        &self,
        approver: &User,
    ) -> Result<Vec<LeaveRequestView>, StoreError>;
    async fn on_leave_today(&self, today: NaiveDate) -> Result<Vec<OnLeaveToday>, StoreError>;
    /// Approved leave for a set of users in one month. Admins see the whole
    /// organization regardless of `user_ids`.
    async fn team_leave(
        &self,
        user_ids: &[u64],
        month: u32,
        year: i32,
        role: Role,
    ) -> Result<Vec<LeaveRequestView>, StoreError>;
}
