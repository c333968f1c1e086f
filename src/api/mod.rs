use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::leave::LeaveError;

pub mod leave;
pub mod leave_type;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::BalanceNotFound | LeaveError::OverlapConflict => StatusCode::CONFLICT,
            LeaveError::LimitExceeded | LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let LeaveError::Store(e) = self {
            error!(error = %e, "storage failure");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
