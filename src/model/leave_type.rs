use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Active;

/// A category of absence with its own annual allowance and approval depth.
///
/// Policy that used to be keyed off well-known type ids lives in explicit
/// flags instead:
/// - `auto_approve`: submission finalizes immediately, no approval chain.
/// - `is_exempt`: the balance is nominal; usage is tracked but the balance
///   is never enforced or decremented.
/// - `carry_forward`: unused balance rolls into the next year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Casual Leave")]
    pub name: String,
    #[schema(example = 10, value_type = f64)]
    pub max_per_year: Decimal,
    /// Number of approval levels normally required (0-3). A zero is
    /// treated as one level at submission time.
    #[schema(example = 1)]
    pub multi_approver: u8,
    pub auto_approve: bool,
    pub is_exempt: bool,
    pub carry_forward: bool,
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
}

impl Active for LeaveType {
    fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
