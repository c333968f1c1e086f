//! In-memory store.
//!
//! Backs the integration suites and doubles as the reference semantics for
//! the MySQL store: one mutex over the whole state gives every operation
//! the row-level atomicity the engine assumes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::leave::conflict::ranges_intersect;
use crate::model::{
    Active,
    leave_balance::{BalanceEntry, LeaveBalance},
    leave_request::{LeaveRequest, LeaveRequestView, LeaveStatus, OnLeaveToday},
    leave_type::LeaveType,
    user::{Role, User},
};

use super::{LeaveStore, NewLeaveRequest, NewLeaveType, StoreError};

#[derive(Default)]
struct MemState {
    users: HashMap<u64, User>,
    leave_types: HashMap<u64, LeaveType>,
    balances: Vec<LeaveBalance>,
    requests: HashMap<u64, LeaveRequest>,
    next_user_id: u64,
    next_type_id: u64,
    next_balance_id: u64,
    next_request_id: u64,
}

#[derive(Default)]
pub struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Directory-side user creation; not part of the engine-facing trait.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        role: Role,
        manager_id: Option<u64>,
    ) -> u64 {
        let mut state = self.lock();
        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                role,
                manager_id,
                is_deleted: false,
            },
        );
        id
    }

    pub fn remove_user(&self, id: u64) {
        let mut state = self.lock();
        if let Some(user) = state.users.get_mut(&id) {
            user.is_deleted = true;
        }
    }
}

fn view_of(state: &MemState, req: &LeaveRequest) -> LeaveRequestView {
    let user = state.users.get(&req.user_id);
    let manager_name = user
        .and_then(|u| u.manager_id)
        .and_then(|mid| state.users.get(&mid))
        .filter(|m| m.is_active())
        .map(|m| m.name.clone());
    LeaveRequestView {
        id: req.id,
        user_id: req.user_id,
        employee_name: user.map(|u| u.name.clone()).unwrap_or_default(),
        leave_type: state
            .leave_types
            .get(&req.leave_type_id)
            .map(|t| t.name.clone())
            .unwrap_or_default(),
        start_date: req.start_date,
        end_date: req.end_date,
        reason: req.reason.clone(),
        status: req.status,
        total_days: req.total_days,
        manager_name,
        created_at: req.created_at,
        updated_at: req.status_updated_at,
    }
}

/// Request/user/type rows that are all still active; deleted rows fall out
/// of every read.
fn request_visible(state: &MemState, req: &LeaveRequest) -> bool {
    req.is_active()
        && state
            .users
            .get(&req.user_id)
            .is_some_and(|u| u.is_active())
        && state
            .leave_types
            .get(&req.leave_type_id)
            .is_some_and(|t| t.is_active())
}

#[async_trait]
impl LeaveStore for MemStore {
    async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state.users.get(&id).filter(|u| u.is_active()).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|u| u.is_active() && u.email == email)
            .cloned())
    }

    async fn all_active_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.lock();
        let mut users: Vec<_> = state.users.values().filter(|u| u.is_active()).cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn assign_manager(
        &self,
        user_id: u64,
        manager_id: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.users.get(&user_id).is_some_and(|u| u.is_active()) {
            return Err(StoreError::NotFound);
        }
        if let Some(mid) = manager_id {
            if !state.users.get(&mid).is_some_and(|u| u.is_active()) {
                return Err(StoreError::NotFound);
            }
            // Walk up from the proposed manager; reaching the user again
            // means the link would close a cycle.
            let mut cursor = Some(mid);
            let mut hops = 0;
            while let Some(cur) = cursor {
                if cur == user_id {
                    return Err(StoreError::ManagerCycle);
                }
                hops += 1;
                if hops > state.users.len() {
                    return Err(StoreError::ManagerCycle);
                }
                cursor = state.users.get(&cur).and_then(|u| u.manager_id);
            }
        }
        if let Some(user) = state.users.get_mut(&user_id) {
            user.manager_id = manager_id;
        }
        Ok(())
    }

    async fn get_leave_type(&self, id: u64) -> Result<Option<LeaveType>, StoreError> {
        let state = self.lock();
        Ok(state.leave_types.get(&id).filter(|t| t.is_active()).cloned())
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, StoreError> {
        let state = self.lock();
        let mut types: Vec<_> = state
            .leave_types
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        types.sort_by_key(|t| t.id);
        Ok(types)
    }

    async fn insert_leave_type(&self, new_type: NewLeaveType) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.next_type_id += 1;
        let id = state.next_type_id;
        state.leave_types.insert(
            id,
            LeaveType {
                id,
                name: new_type.name,
                max_per_year: new_type.max_per_year,
                multi_approver: new_type.multi_approver,
                auto_approve: new_type.auto_approve,
                is_exempt: new_type.is_exempt,
                carry_forward: new_type.carry_forward,
                is_deleted: false,
            },
        );
        Ok(id)
    }

    async fn update_leave_type(
        &self,
        id: u64,
        name: &str,
        max_per_year: Decimal,
        multi_approver: u8,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.leave_types.get_mut(&id).filter(|t| !t.is_deleted) {
            Some(lt) => {
                lt.name = name.to_string();
                lt.max_per_year = max_per_year;
                lt.multi_approver = multi_approver;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_leave_type(&self, id: u64) -> Result<bool, StoreError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(lt) = state.leave_types.get_mut(&id).filter(|t| !t.is_deleted) else {
            return Ok(false);
        };
        lt.is_deleted = true;
        for req in state.requests.values_mut() {
            if req.leave_type_id == id {
                req.is_deleted = true;
            }
        }
        Ok(true)
    }

    async fn get_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, StoreError> {
        let state = self.lock();
        Ok(state
            .balances
            .iter()
            .find(|b| {
                b.is_active()
                    && b.user_id == user_id
                    && b.leave_type_id == leave_type_id
                    && b.year == year
            })
            .cloned())
    }

    async fn balances_for_user_year(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<Vec<BalanceEntry>, StoreError> {
        let state = self.lock();
        let mut rows: Vec<(u64, BalanceEntry)> = state
            .balances
            .iter()
            .filter(|b| b.is_active() && b.user_id == user_id && b.year == year)
            .filter_map(|b| {
                let lt = state
                    .leave_types
                    .get(&b.leave_type_id)
                    .filter(|t| t.is_active())?;
                Some((
                    b.leave_type_id,
                    BalanceEntry {
                        leave_type: lt.name.clone(),
                        total: b.balance + b.used,
                        balance: b.balance,
                        used: b.used,
                        is_exempt: lt.is_exempt,
                    },
                ))
            })
            .collect();
        rows.sort_by_key(|(type_id, _)| *type_id);
        Ok(rows.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn balances_for_type_year(
        &self,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        let state = self.lock();
        Ok(state
            .balances
            .iter()
            .filter(|b| b.is_active() && b.leave_type_id == leave_type_id && b.year == year)
            .cloned()
            .collect())
    }

    async fn init_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let exists = state.balances.iter().any(|b| {
            b.is_active()
                && b.user_id == user_id
                && b.leave_type_id == leave_type_id
                && b.year == year
        });
        if exists {
            return Ok(false);
        }
        state.next_balance_id += 1;
        let id = state.next_balance_id;
        state.balances.push(LeaveBalance {
            id,
            user_id,
            leave_type_id,
            year,
            balance,
            used: Decimal::ZERO,
            is_deleted: false,
        });
        Ok(true)
    }

    async fn apply_balance_delta(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance_delta: Decimal,
        used_delta: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let row = state.balances.iter_mut().find(|b| {
            b.is_active()
                && b.user_id == user_id
                && b.leave_type_id == leave_type_id
                && b.year == year
        });
        match row {
            Some(b) => {
                b.balance += balance_delta;
                b.used += used_delta;
                Ok(())
            }
            None => Err(StoreError::BalanceMissing {
                user_id,
                leave_type_id,
                year,
            }),
        }
    }

    async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let state = self.lock();
        Ok(state
            .requests
            .get(&id)
            .filter(|r| request_visible(&state, r))
            .cloned())
    }

    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let state = self.lock();
        Ok(overlap_exists(&state, user_id, start_date, end_date))
    }

    async fn insert_request(&self, req: NewLeaveRequest) -> Result<u64, StoreError> {
        let mut state = self.lock();
        // Re-check under the lock: of two racing submissions at most one
        // may pass the overlap gate.
        if overlap_exists(&state, req.user_id, req.start_date, req.end_date) {
            return Err(StoreError::Overlap);
        }
        state.next_request_id += 1;
        let id = state.next_request_id;
        state.requests.insert(
            id,
            LeaveRequest {
                id,
                user_id: req.user_id,
                leave_type_id: req.leave_type_id,
                start_date: req.start_date,
                end_date: req.end_date,
                is_half_day: req.is_half_day,
                half_day_type: req.half_day_type,
                reason: req.reason,
                status: req.status,
                final_approval_level: req.final_approval_level,
                total_days: req.total_days,
                level2_approver_id: req.level2_approver_id,
                level3_approver_id: req.level3_approver_id,
                created_at: Utc::now(),
                status_updated_at: None,
                is_deleted: false,
            },
        );
        Ok(id)
    }

    async fn update_status_if(
        &self,
        id: u64,
        expected: LeaveStatus,
        next: LeaveStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let Some(req) = state.requests.get_mut(&id).filter(|r| !r.is_deleted) else {
            return Ok(false);
        };
        if req.status != expected {
            return Ok(false);
        }
        req.status = next;
        req.status_updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn history_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequestView>, StoreError> {
        let state = self.lock();
        let mut requests: Vec<&LeaveRequest> = state
            .requests
            .values()
            .filter(|r| r.user_id == user_id && request_visible(&state, r))
            .collect();
        requests.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(requests.into_iter().map(|r| view_of(&state, r)).collect())
    }

    async fn incoming_for_approver(
        &self,
        approver: &User,
    ) -> Result<Vec<LeaveRequestView>, StoreError> {
        let state = self.lock();
        let mut matched: Vec<&LeaveRequest> = state
            .requests
            .values()
            .filter(|r| request_visible(&state, r))
            .filter(|r| {
                let Some(requester) = state.users.get(&r.user_id) else {
                    return false;
                };
                let direct_report = requester.manager_id == Some(approver.id);
                match approver.role {
                    Role::Admin => {
                        (r.status == LeaveStatus::Pending && requester.role == Role::Hr)
                            || (r.status == LeaveStatus::PendingL3
                                && r.level3_approver_id == Some(approver.id))
                            || (r.status == LeaveStatus::PendingL2
                                && r.level2_approver_id == Some(approver.id))
                    }
                    Role::Hr => {
                        (matches!(r.status, LeaveStatus::Pending | LeaveStatus::PendingL1)
                            && direct_report)
                            || (r.status == LeaveStatus::PendingL2
                                && r.level2_approver_id == Some(approver.id))
                    }
                    Role::Manager => {
                        matches!(r.status, LeaveStatus::Pending | LeaveStatus::PendingL1)
                            && direct_report
                    }
                    Role::Employee => false,
                }
            })
            .collect();
        matched.sort_by_key(|r| r.id);
        Ok(matched.into_iter().map(|r| view_of(&state, r)).collect())
    }

    async fn on_leave_today(&self, today: NaiveDate) -> Result<Vec<OnLeaveToday>, StoreError> {
        let state = self.lock();
        let mut rows: Vec<OnLeaveToday> = state
            .requests
            .values()
            .filter(|r| {
                r.status == LeaveStatus::Approved
                    && r.start_date <= today
                    && r.end_date >= today
                    && request_visible(&state, r)
            })
            .filter_map(|r| {
                let user = state.users.get(&r.user_id)?;
                let lt = state.leave_types.get(&r.leave_type_id)?;
                Some(OnLeaveToday {
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    start_date: r.start_date,
                    end_date: r.end_date,
                    leave_type: lt.name.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.user_id);
        Ok(rows)
    }

    async fn team_leave(
        &self,
        user_ids: &[u64],
        month: u32,
        year: i32,
        role: Role,
    ) -> Result<Vec<LeaveRequestView>, StoreError> {
        let state = self.lock();
        let mut matched: Vec<&LeaveRequest> = state
            .requests
            .values()
            .filter(|r| {
                r.status == LeaveStatus::Approved
                    && r.start_date.month() == month
                    && r.start_date.year() == year
                    && request_visible(&state, r)
                    && (role == Role::Admin || user_ids.contains(&r.user_id))
            })
            .collect();
        matched.sort_by_key(|r| r.id);
        Ok(matched.into_iter().map(|r| view_of(&state, r)).collect())
    }
}

fn overlap_exists(state: &MemState, user_id: u64, start: NaiveDate, end: NaiveDate) -> bool {
    state.requests.values().any(|r| {
        r.user_id == user_id
            && r.is_active()
            && r.status.blocks_overlap()
            && ranges_intersect(r.start_date, r.end_date, start, end)
    })
}
