use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::leave::{LeaveError, types};
use crate::store::{MySqlStore, NewLeaveType};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Casual Leave")]
    pub name: String,
    #[schema(example = 10, value_type = f64)]
    pub max_per_year: Decimal,
    /// Approval levels normally required (0-3); defaults to 1.
    #[serde(default = "default_multi_approver")]
    #[schema(example = 1)]
    pub multi_approver: u8,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub is_exempt: bool,
    #[serde(default)]
    pub carry_forward: bool,
}

fn default_multi_approver() -> u8 {
    1
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveType {
    pub name: String,
    #[schema(value_type = f64)]
    pub max_per_year: Decimal,
    #[serde(default = "default_multi_approver")]
    pub multi_approver: u8,
}

#[utoipa::path(
    get,
    path = "/api/leave-type",
    responses(
        (status = 200, description = "Active leave types",
         body = Vec<crate::model::leave_type::LeaveType>)
    ),
    tag = "LeaveType"
)]
pub async fn list_leave_types(store: web::Data<MySqlStore>) -> Result<HttpResponse, LeaveError> {
    let leave_types = types::list(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(leave_types))
}

/// Creates a leave type and provisions a current-year balance row for
/// every active user.
#[utoipa::path(
    post,
    path = "/api/leave-type",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = Object, example = json!({
            "message": "Leave type added successfully",
            "leave_type_id": 8
        }))
    ),
    tag = "LeaveType"
)]
pub async fn create_leave_type(
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateLeaveType>,
) -> Result<HttpResponse, LeaveError> {
    let payload = payload.into_inner();
    let year = Utc::now().year();
    let leave_type_id = types::add(
        store.get_ref(),
        NewLeaveType {
            name: payload.name,
            max_per_year: payload.max_per_year,
            multi_approver: payload.multi_approver,
            auto_approve: payload.auto_approve,
            is_exempt: payload.is_exempt,
            carry_forward: payload.carry_forward,
        },
        year,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave type added successfully",
        "leave_type_id": leave_type_id
    })))
}

#[utoipa::path(
    put,
    path = "/api/leave-type/{id}",
    params(("id" = u64, Path, description = "Leave type id")),
    request_body = UpdateLeaveType,
    responses(
        (status = 200, description = "Leave type updated"),
        (status = 404, description = "Leave type not found")
    ),
    tag = "LeaveType"
)]
pub async fn update_leave_type(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveType>,
) -> Result<HttpResponse, LeaveError> {
    types::update(
        store.get_ref(),
        path.into_inner(),
        &payload.name,
        payload.max_per_year,
        payload.multi_approver,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave type updated successfully"
    })))
}

/// Soft-deletes the type; its leave requests are soft-deleted with it.
#[utoipa::path(
    delete,
    path = "/api/leave-type/{id}",
    params(("id" = u64, Path, description = "Leave type id")),
    responses(
        (status = 200, description = "Leave type deleted"),
        (status = 404, description = "Leave type not found")
    ),
    tag = "LeaveType"
)]
pub async fn delete_leave_type(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    types::delete(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave type deleted successfully"
    })))
}
