//! Default leave-type catalogue.

use rust_decimal::Decimal;

use super::NewLeaveType;

/// The standard organizational leave types. Emergency Leave finalizes at
/// submission and Loss of Pay tracks usage only; neither depletes a real
/// balance, and neither carries forward. Maternity/Paternity do not carry
/// forward either.
pub fn default_leave_types() -> Vec<NewLeaveType> {
    fn plain(name: &str, max_per_year: i64, multi_approver: u8, carry_forward: bool) -> NewLeaveType {
        NewLeaveType {
            name: name.to_string(),
            max_per_year: Decimal::from(max_per_year),
            multi_approver,
            auto_approve: false,
            is_exempt: false,
            carry_forward,
        }
    }

    vec![
        plain("Casual Leave", 10, 1, true),
        plain("Sick Leave", 14, 1, true),
        plain("Paid Leave", 16, 2, true),
        plain("Maternity Leave", 20, 3, false),
        plain("Paternity Leave", 20, 3, false),
        NewLeaveType {
            name: "Emergency Leave".to_string(),
            max_per_year: Decimal::from(15),
            multi_approver: 0,
            auto_approve: true,
            is_exempt: true,
            carry_forward: false,
        },
        NewLeaveType {
            name: "Loss of Pay".to_string(),
            max_per_year: Decimal::from(20),
            multi_approver: 1,
            auto_approve: false,
            is_exempt: true,
            carry_forward: false,
        },
    ]
}
