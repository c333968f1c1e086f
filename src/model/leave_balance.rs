use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Active;

/// One row per (user, leave type, year). `balance + used` is the year's
/// total entitlement: approval and cancellation move units between the two
/// fields, only provisioning and carry-forward change the sum. For exempt
/// leave types the balance is nominal and never decremented.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub id: u64,
    pub user_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub balance: Decimal,
    pub used: Decimal,
    pub is_deleted: bool,
}

impl Active for LeaveBalance {
    fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Balance row joined with its leave type, as rendered in summaries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceEntry {
    #[schema(example = "Casual Leave")]
    pub leave_type: String,
    #[schema(example = 10.0, value_type = f64)]
    pub total: Decimal,
    #[schema(example = 7.5, value_type = f64)]
    pub balance: Decimal,
    #[schema(example = 2.5, value_type = f64)]
    pub used: Decimal,
    #[serde(skip_serializing, default)]
    pub is_exempt: bool,
}
