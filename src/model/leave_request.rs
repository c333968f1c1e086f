use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::Active;

/// Lifecycle states of a leave request. `Pending` is the initial state of a
/// single-level flow, `PendingL1` of a multi-level flow; `Approved`,
/// `Rejected` and `Cancelled` are terminal.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum LeaveStatus {
    #[strum(serialize = "Pending")]
    #[serde(rename = "Pending")]
    Pending,
    #[strum(serialize = "Pending (L1)")]
    #[serde(rename = "Pending (L1)")]
    PendingL1,
    #[strum(serialize = "Pending (L2)")]
    #[serde(rename = "Pending (L2)")]
    PendingL2,
    #[strum(serialize = "Pending (L3)")]
    #[serde(rename = "Pending (L3)")]
    PendingL3,
    #[strum(serialize = "Approved")]
    #[serde(rename = "Approved")]
    Approved,
    #[strum(serialize = "Rejected")]
    #[serde(rename = "Rejected")]
    Rejected,
    #[strum(serialize = "Cancelled")]
    #[serde(rename = "Cancelled")]
    Cancelled,
}

/// Effect of an approval action on a request in a given state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transition {
    /// Move to the next pending level; no ledger effect.
    Advance(LeaveStatus),
    /// Last required approval: set `Approved` and debit the ledger.
    Finalize,
    /// The request already reached a terminal state.
    AlreadyProcessed,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }

    /// Whether a request in this state blocks overlapping submissions:
    /// pending at any level, or approved. Rejected and cancelled requests
    /// are out of the comparison set.
    pub fn blocks_overlap(self) -> bool {
        !matches!(self, LeaveStatus::Rejected | LeaveStatus::Cancelled)
    }

    /// The transition table for the approve action. `final_level` is the
    /// request's computed `final_approval_level` (1-3).
    pub fn on_approve(self, final_level: u8) -> Transition {
        match self {
            LeaveStatus::Pending | LeaveStatus::PendingL3 => Transition::Finalize,
            LeaveStatus::PendingL1 => Transition::Advance(LeaveStatus::PendingL2),
            LeaveStatus::PendingL2 if final_level == 3 => {
                Transition::Advance(LeaveStatus::PendingL3)
            }
            LeaveStatus::PendingL2 => Transition::Finalize,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled => {
                Transition::AlreadyProcessed
            }
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HalfDayType {
    Am,
    Pm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub reason: String,
    pub status: LeaveStatus,
    /// Number of approval hops required, computed at creation (1-3).
    pub final_approval_level: u8,
    pub total_days: Decimal,
    /// Level-2/3 approvers resolved at creation time, kept for audit even
    /// if the hierarchy changes afterwards.
    pub level2_approver_id: Option<u64>,
    pub level3_approver_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl Active for LeaveRequest {
    fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Request joined with requester and leave-type names, as rendered in
/// history and incoming-approval listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequestView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "Casual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(example = 5.0, value_type = f64)]
    pub total_days: Decimal,
    #[schema(example = "Jane Smith", nullable = true)]
    pub manager_name: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of the who-is-out-today report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnLeaveToday {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub leave_type: String,
}
