use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::Active;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Hr,
    Admin,
}

/// A user in the directory. `manager_id` forms a forest: every user has at
/// most one manager, root users (admins) have none. The relation must stay
/// acyclic; `assign_manager` in the store enforces that on reassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub manager_id: Option<u64>,
    pub is_deleted: bool,
}

impl Active for User {
    fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
