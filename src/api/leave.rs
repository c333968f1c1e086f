use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::leave::{LeaveError, carry_forward, ledger, lifecycle};
use crate::model::leave_request::HalfDayType;
use crate::store::{LeaveStore, MySqlStore};

#[derive(Deserialize, ToSchema)]
pub struct SubmitLeaveRequest {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    #[serde(default)]
    #[schema(example = "Family function")]
    pub reason: String,
    #[schema(example = 5.0, value_type = f64)]
    pub total_days: Decimal,
}

#[derive(Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Defaults to the current year.
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams)]
pub struct TeamLeaveQuery {
    /// Requesting user; their role decides the visible scope.
    pub user_id: u64,
    /// Comma-separated team member ids.
    pub members: Option<String>,
    pub month: u32,
    pub year: i32,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = SubmitLeaveRequest,
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave requested successfully",
            "request_id": 17
        })),
        (status = 400, description = "Validation failure or leave limit exceeded"),
        (status = 404, description = "User or leave type not found"),
        (status = 409, description = "Dates overlap an existing request, or balance row missing")
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    store: web::Data<MySqlStore>,
    payload: web::Json<SubmitLeaveRequest>,
) -> Result<HttpResponse, LeaveError> {
    let payload = payload.into_inner();
    let request_id = lifecycle::submit(
        store.get_ref(),
        lifecycle::SubmitLeave {
            user_id: payload.user_id,
            leave_type_id: payload.leave_type_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            is_half_day: payload.is_half_day,
            half_day_type: payload.half_day_type,
            reason: payload.reason,
            total_days: payload.total_days,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave requested successfully",
        "request_id": request_id
    })))
}

/* =========================
Approve / reject / cancel
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Approval processed", body = Object, example = json!({
            "message": "Leave approval processed",
            "next_step": "Approved (L2)"
        })),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let outcome = lifecycle::approve(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approval processed",
        "next_step": outcome.next_step()
    })))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Rejection processed"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let outcome = lifecycle::reject(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected",
        "next_step": outcome.next_step()
    })))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/cancel",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Cancellation processed"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let outcome = lifecycle::cancel(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave cancelled",
        "next_step": outcome.next_step()
    })))
}

/* =========================
Balances and history
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/balance/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User id"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Per-type balances with totals", body = crate::leave::ledger::BalanceSummary)
    ),
    tag = "Leave"
)]
pub async fn get_balance(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, LeaveError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let summary = ledger::summary(store.get_ref(), path.into_inner(), year).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/leave/history/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Leave history, most recent first",
         body = Vec<crate::model::leave_request::LeaveRequestView>)
    ),
    tag = "Leave"
)]
pub async fn get_history(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let history = lifecycle::history(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "leave_history": history })))
}

#[utoipa::path(
    get,
    path = "/api/leave/incoming/{approver_id}",
    params(("approver_id" = u64, Path, description = "Approver user id")),
    responses(
        (status = 200, description = "Requests awaiting this approver",
         body = Vec<crate::model::leave_request::LeaveRequestView>),
        (status = 404, description = "Approver not found")
    ),
    tag = "Leave"
)]
pub async fn incoming_requests(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let incoming = lifecycle::incoming_requests(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "incoming_requests": incoming })))
}

/* =========================
Reports
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/today",
    responses(
        (status = 200, description = "Users on approved leave today",
         body = Vec<crate::model::leave_request::OnLeaveToday>)
    ),
    tag = "Leave"
)]
pub async fn on_leave_today(store: web::Data<MySqlStore>) -> Result<HttpResponse, LeaveError> {
    let today = Utc::now().date_naive();
    let users = lifecycle::users_on_leave(store.get_ref(), today).await?;
    Ok(HttpResponse::Ok().json(json!({
        "count": users.len(),
        "users": users
    })))
}

#[utoipa::path(
    get,
    path = "/api/leave/team",
    params(TeamLeaveQuery),
    responses(
        (status = 200, description = "Approved team leave for the month",
         body = Vec<crate::model::leave_request::LeaveRequestView>),
        (status = 404, description = "Requesting user not found")
    ),
    tag = "Leave"
)]
pub async fn team_leave(
    store: web::Data<MySqlStore>,
    query: web::Query<TeamLeaveQuery>,
) -> Result<HttpResponse, LeaveError> {
    let requester = store
        .get_ref()
        .get_user(query.user_id)
        .await
        .map_err(LeaveError::from)?
        .ok_or(LeaveError::NotFound("user"))?;

    let member_ids: Vec<u64> = query
        .members
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();

    let requests = lifecycle::team_leave(
        store.get_ref(),
        &member_ids,
        query.month,
        query.year,
        requester.role,
    )
    .await?;
    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
Carry-forward (admin trigger)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/carry-forward",
    responses(
        (status = 200, description = "Carry-forward executed", body = Object, example = json!({
            "message": "Carry-forward completed",
            "created": 12,
            "skipped": 3
        }))
    ),
    tag = "Leave"
)]
pub async fn run_carry_forward(store: web::Data<MySqlStore>) -> Result<HttpResponse, LeaveError> {
    let year = Utc::now().year();
    let report = carry_forward::run(store.get_ref(), year).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Carry-forward completed",
        "created": report.created,
        "skipped": report.skipped
    })))
}
