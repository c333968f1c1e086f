use crate::api::leave::SubmitLeaveRequest;
use crate::api::leave_type::{CreateLeaveType, UpdateLeaveType};
use crate::leave::ledger::BalanceSummary;
use crate::model::leave_balance::BalanceEntry;
use crate::model::leave_request::{HalfDayType, LeaveRequestView, LeaveStatus, OnLeaveToday};
use crate::model::leave_type::LeaveType;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Engine API",
        version = "1.0.0",
        description = r#"
## Leave Management Engine

This API tracks employee absence requests against per-employee, per-leave-type
annual allowances and routes each request through a variable-depth managerial
approval chain.

### Key Features
- **Leave Requests**
  - Submit requests with balance, overlap and hierarchy checks
  - Approve through up to three managerial levels, reject, cancel
- **Balances**
  - Per user/leave-type/year accounts, debited at final approval only
- **Reports**
  - Who is out today, approved team leave per month
- **Leave Types**
  - Manage types, allowances, approval depth; provisioning on creation

### Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::submit_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,
        crate::api::leave::get_balance,
        crate::api::leave::get_history,
        crate::api::leave::incoming_requests,
        crate::api::leave::on_leave_today,
        crate::api::leave::team_leave,
        crate::api::leave::run_carry_forward,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type
    ),
    components(
        schemas(
            SubmitLeaveRequest,
            CreateLeaveType,
            UpdateLeaveType,
            BalanceSummary,
            BalanceEntry,
            LeaveRequestView,
            LeaveStatus,
            HalfDayType,
            OnLeaveToday,
            LeaveType
        )
    ),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "LeaveType", description = "Leave type management APIs"),
    )
)]
pub struct ApiDoc;
