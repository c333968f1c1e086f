pub mod leave_balance;
pub mod leave_request;
pub mod leave_type;
pub mod user;

/// Uniform soft-delete predicate. Store implementations filter every read
/// through this instead of re-checking `is_deleted` ad hoc per query.
pub trait Active {
    fn is_active(&self) -> bool;
}
