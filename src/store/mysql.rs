//! MySQL store.
//!
//! Every racy read-modify-write is a single statement (status CAS, balance
//! delta, guarded existence insert) or a short transaction with a
//! `FOR UPDATE` read (overlap-guarded insert, manager reassignment), so
//! concurrent callers serialize at the row level.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySqlPool, prelude::FromRow};
use strum::IntoEnumIterator;
use tracing::error;

use crate::model::{
    leave_balance::{BalanceEntry, LeaveBalance},
    leave_request::{
        HalfDayType, LeaveRequest, LeaveRequestView, LeaveStatus, OnLeaveToday,
    },
    leave_type::LeaveType,
    user::{Role, User},
};

use super::{LeaveStore, NewLeaveRequest, NewLeaveType, StoreError};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    email: String,
    role: String,
    manager_id: Option<u64>,
    is_deleted: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, StoreError> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| StoreError::Invalid(format!("role `{}`", row.role)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            manager_id: row.manager_id,
            is_deleted: row.is_deleted,
        })
    }
}

#[derive(FromRow)]
struct LeaveTypeRow {
    id: u64,
    name: String,
    max_per_year: Decimal,
    multi_approver: u8,
    auto_approve: bool,
    is_exempt: bool,
    carry_forward: bool,
    is_deleted: bool,
}

impl From<LeaveTypeRow> for LeaveType {
    fn from(row: LeaveTypeRow) -> Self {
        LeaveType {
            id: row.id,
            name: row.name,
            max_per_year: row.max_per_year,
            multi_approver: row.multi_approver,
            auto_approve: row.auto_approve,
            is_exempt: row.is_exempt,
            carry_forward: row.carry_forward,
            is_deleted: row.is_deleted,
        }
    }
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    user_id: u64,
    leave_type_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_half_day: bool,
    half_day_type: Option<String>,
    reason: Option<String>,
    status: String,
    final_approval_level: u8,
    total_days: Decimal,
    level2_approver_id: Option<u64>,
    level3_approver_id: Option<u64>,
    created_at: DateTime<Utc>,
    status_updated_at: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, StoreError> {
        let status = parse_status(&row.status)?;
        let half_day_type = row
            .half_day_type
            .as_deref()
            .map(|s| {
                s.parse::<HalfDayType>()
                    .map_err(|_| StoreError::Invalid(format!("half_day_type `{s}`")))
            })
            .transpose()?;
        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            leave_type_id: row.leave_type_id,
            start_date: row.start_date,
            end_date: row.end_date,
            is_half_day: row.is_half_day,
            half_day_type,
            reason: row.reason.unwrap_or_default(),
            status,
            final_approval_level: row.final_approval_level,
            total_days: row.total_days,
            level2_approver_id: row.level2_approver_id,
            level3_approver_id: row.level3_approver_id,
            created_at: row.created_at,
            status_updated_at: row.status_updated_at,
            is_deleted: row.is_deleted,
        })
    }
}

#[derive(FromRow)]
struct ViewRow {
    id: u64,
    user_id: u64,
    employee_name: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    status: String,
    total_days: Decimal,
    manager_name: Option<String>,
    created_at: DateTime<Utc>,
    status_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ViewRow> for LeaveRequestView {
    type Error = StoreError;

    fn try_from(row: ViewRow) -> Result<Self, StoreError> {
        Ok(LeaveRequestView {
            id: row.id,
            user_id: row.user_id,
            employee_name: row.employee_name,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason.unwrap_or_default(),
            status: parse_status(&row.status)?,
            total_days: row.total_days,
            manager_name: row.manager_name,
            created_at: row.created_at,
            updated_at: row.status_updated_at,
        })
    }
}

fn parse_status(raw: &str) -> Result<LeaveStatus, StoreError> {
    raw.parse::<LeaveStatus>()
        .map_err(|_| StoreError::Invalid(format!("status `{raw}`")))
}

/// `?, ?, ...` placeholder list plus the status strings to bind, for the
/// pending-or-approved overlap set.
fn blocking_status_binds() -> (String, Vec<String>) {
    let statuses: Vec<String> = LeaveStatus::iter()
        .filter(|s| s.blocks_overlap())
        .map(|s| s.to_string())
        .collect();
    let placeholders = vec!["?"; statuses.len()].join(", ");
    (placeholders, statuses)
}

const VIEW_SELECT: &str = r#"
    SELECT
        lr.id,
        lr.user_id,
        u.name AS employee_name,
        lt.name AS leave_type,
        lr.start_date,
        lr.end_date,
        lr.reason,
        lr.status,
        lr.total_days,
        mgr.name AS manager_name,
        lr.created_at,
        lr.status_updated_at
    FROM leave_requests lr
    INNER JOIN users u ON u.id = lr.user_id AND u.is_deleted = FALSE
    INNER JOIN leave_types lt ON lt.id = lr.leave_type_id AND lt.is_deleted = FALSE
    LEFT JOIN users mgr ON mgr.id = u.manager_id AND mgr.is_deleted = FALSE
    WHERE lr.is_deleted = FALSE
"#;

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn get_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, manager_id, is_deleted
            FROM users
            WHERE id = ? AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, manager_id, is_deleted
            FROM users
            WHERE email = ? AND is_deleted = FALSE
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn all_active_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, manager_id, is_deleted
            FROM users
            WHERE is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn assign_manager(
        &self,
        user_id: u64,
        manager_id: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE id = ? AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if exists == 0 {
            return Err(StoreError::NotFound);
        }

        if let Some(mid) = manager_id {
            // Walk the chain upwards from the proposed manager inside the
            // transaction; hitting the user again means a cycle.
            let mut cursor = Some(mid);
            let mut hops: u32 = 0;
            while let Some(cur) = cursor {
                if cur == user_id {
                    return Err(StoreError::ManagerCycle);
                }
                hops += 1;
                if hops > 64 {
                    return Err(StoreError::ManagerCycle);
                }
                let link: Option<Option<u64>> = sqlx::query_scalar(
                    "SELECT manager_id FROM users WHERE id = ? AND is_deleted = FALSE FOR UPDATE",
                )
                .bind(cur)
                .fetch_optional(&mut *tx)
                .await?;
                match link {
                    Some(next) => cursor = next,
                    None if cur == mid => return Err(StoreError::NotFound),
                    None => cursor = None,
                }
            }
        }

        sqlx::query("UPDATE users SET manager_id = ? WHERE id = ?")
            .bind(manager_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_leave_type(&self, id: u64) -> Result<Option<LeaveType>, StoreError> {
        let row = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, max_per_year, multi_approver,
                   auto_approve, is_exempt, carry_forward, is_deleted
            FROM leave_types
            WHERE id = ? AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LeaveType::from))
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, max_per_year, multi_approver,
                   auto_approve, is_exempt, carry_forward, is_deleted
            FROM leave_types
            WHERE is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeaveType::from).collect())
    }

    async fn insert_leave_type(&self, new_type: NewLeaveType) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_types
                (name, max_per_year, multi_approver, auto_approve, is_exempt, carry_forward)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_type.name)
        .bind(new_type.max_per_year)
        .bind(new_type.multi_approver)
        .bind(new_type.auto_approve)
        .bind(new_type.is_exempt)
        .bind(new_type.carry_forward)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn update_leave_type(
        &self,
        id: u64,
        name: &str,
        max_per_year: Decimal,
        multi_approver: u8,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_types
            SET name = ?, max_per_year = ?, multi_approver = ?
            WHERE id = ? AND is_deleted = FALSE
            "#,
        )
        .bind(name)
        .bind(max_per_year)
        .bind(multi_approver)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_leave_type(&self, id: u64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result =
            sqlx::query("UPDATE leave_types SET is_deleted = TRUE WHERE id = ? AND is_deleted = FALSE")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("UPDATE leave_requests SET is_deleted = TRUE WHERE leave_type_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn get_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, StoreError> {
        let row = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id, user_id, leave_type_id, year, balance, used, is_deleted
            FROM leave_balances
            WHERE user_id = ? AND leave_type_id = ? AND year = ? AND is_deleted = FALSE
            "#,
        )
        .bind(user_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn balances_for_user_year(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<Vec<BalanceEntry>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            leave_type: String,
            balance: Decimal,
            used: Decimal,
            is_exempt: bool,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT lt.name AS leave_type, lb.balance, lb.used, lt.is_exempt
            FROM leave_balances lb
            INNER JOIN leave_types lt ON lt.id = lb.leave_type_id AND lt.is_deleted = FALSE
            WHERE lb.user_id = ? AND lb.year = ? AND lb.is_deleted = FALSE
            ORDER BY lb.leave_type_id
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BalanceEntry {
                leave_type: r.leave_type,
                total: r.balance + r.used,
                balance: r.balance,
                used: r.used,
                is_exempt: r.is_exempt,
            })
            .collect())
    }

    async fn balances_for_type_year(
        &self,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id, user_id, leave_type_id, year, balance, used, is_deleted
            FROM leave_balances
            WHERE leave_type_id = ? AND year = ? AND is_deleted = FALSE
            "#,
        )
        .bind(leave_type_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn init_balance(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        // Guarded existence insert: atomic, so concurrent provisioning or
        // carry-forward runs create at most one row.
        let result = sqlx::query(
            r#"
            INSERT INTO leave_balances (user_id, leave_type_id, year, balance, used)
            SELECT ?, ?, ?, ?, 0
            FROM DUAL
            WHERE NOT EXISTS (
                SELECT 1 FROM leave_balances
                WHERE user_id = ? AND leave_type_id = ? AND year = ? AND is_deleted = FALSE
            )
            "#,
        )
        .bind(user_id)
        .bind(leave_type_id)
        .bind(year)
        .bind(balance)
        .bind(user_id)
        .bind(leave_type_id)
        .bind(year)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_balance_delta(
        &self,
        user_id: u64,
        leave_type_id: u64,
        year: i32,
        balance_delta: Decimal,
        used_delta: Decimal,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET balance = balance + ?, used = used + ?
            WHERE user_id = ? AND leave_type_id = ? AND year = ? AND is_deleted = FALSE
            "#,
        )
        .bind(balance_delta)
        .bind(used_delta)
        .bind(user_id)
        .bind(leave_type_id)
        .bind(year)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            error!(user_id, leave_type_id, year, "balance row missing for delta");
            return Err(StoreError::BalanceMissing {
                user_id,
                leave_type_id,
                year,
            });
        }
        Ok(())
    }

    async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(
            r#"
            SELECT lr.id, lr.user_id, lr.leave_type_id, lr.start_date, lr.end_date,
                   lr.is_half_day, lr.half_day_type, lr.reason, lr.status,
                   lr.final_approval_level, lr.total_days,
                   lr.level2_approver_id, lr.level3_approver_id,
                   lr.created_at, lr.status_updated_at, lr.is_deleted
            FROM leave_requests lr
            INNER JOIN users u ON u.id = lr.user_id AND u.is_deleted = FALSE
            INNER JOIN leave_types lt ON lt.id = lr.leave_type_id AND lt.is_deleted = FALSE
            WHERE lr.id = ? AND lr.is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let (placeholders, statuses) = blocking_status_binds();
        let sql = format!(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE user_id = ? AND is_deleted = FALSE
              AND status IN ({placeholders})
              AND start_date <= ? AND end_date >= ?
            "#
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
        for status in &statuses {
            query = query.bind(status);
        }
        let count = query
            .bind(end_date)
            .bind(start_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert_request(&self, req: NewLeaveRequest) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the user's blocking requests, then re-check overlap before
        // inserting: of two racing submissions at most one passes.
        let (placeholders, statuses) = blocking_status_binds();
        let guard_sql = format!(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE user_id = ? AND is_deleted = FALSE
              AND status IN ({placeholders})
              AND start_date <= ? AND end_date >= ?
            FOR UPDATE
            "#
        );
        let mut guard = sqlx::query_scalar::<_, i64>(&guard_sql).bind(req.user_id);
        for status in &statuses {
            guard = guard.bind(status);
        }
        let conflicting = guard
            .bind(req.end_date)
            .bind(req.start_date)
            .fetch_one(&mut *tx)
            .await?;
        if conflicting > 0 {
            return Err(StoreError::Overlap);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, leave_type_id, start_date, end_date, is_half_day, half_day_type,
                 reason, status, final_approval_level, total_days,
                 level2_approver_id, level3_approver_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.user_id)
        .bind(req.leave_type_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.is_half_day)
        .bind(req.half_day_type.map(|h| h.to_string()))
        .bind(&req.reason)
        .bind(req.status.to_string())
        .bind(req.final_approval_level)
        .bind(req.total_days)
        .bind(req.level2_approver_id)
        .bind(req.level3_approver_id)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id();
        tx.commit().await?;
        Ok(id)
    }

    async fn update_status_if(
        &self,
        id: u64,
        expected: LeaveStatus,
        next: LeaveStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, status_updated_at = NOW()
            WHERE id = ? AND status = ? AND is_deleted = FALSE
            "#,
        )
        .bind(next.to_string())
        .bind(id)
        .bind(expected.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn history_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequestView>, StoreError> {
        let sql = format!(
            "{VIEW_SELECT} AND lr.user_id = ? ORDER BY lr.created_at DESC, lr.id DESC"
        );
        let rows = sqlx::query_as::<_, ViewRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveRequestView::try_from).collect()
    }

    async fn incoming_for_approver(
        &self,
        approver: &User,
    ) -> Result<Vec<LeaveRequestView>, StoreError> {
        let (filter, bind_count) = match approver.role {
            Role::Admin => (
                r#"AND (
                    (lr.status = 'Pending' AND u.role = 'hr')
                    OR (lr.status = 'Pending (L3)' AND lr.level3_approver_id = ?)
                    OR (lr.status = 'Pending (L2)' AND lr.level2_approver_id = ?)
                )"#,
                2,
            ),
            Role::Hr => (
                r#"AND (
                    (lr.status IN ('Pending', 'Pending (L1)') AND u.manager_id = ?)
                    OR (lr.status = 'Pending (L2)' AND lr.level2_approver_id = ?)
                )"#,
                2,
            ),
            Role::Manager => (
                "AND (lr.status IN ('Pending', 'Pending (L1)') AND u.manager_id = ?)",
                1,
            ),
            Role::Employee => return Ok(Vec::new()),
        };

        let sql = format!("{VIEW_SELECT} {filter} ORDER BY lr.id");
        let mut query = sqlx::query_as::<_, ViewRow>(&sql);
        for _ in 0..bind_count {
            query = query.bind(approver.id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(LeaveRequestView::try_from).collect()
    }

    async fn on_leave_today(&self, today: NaiveDate) -> Result<Vec<OnLeaveToday>, StoreError> {
        #[derive(FromRow)]
        struct Row {
            user_id: u64,
            name: String,
            email: String,
            start_date: NaiveDate,
            end_date: NaiveDate,
            leave_type: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT u.id AS user_id, u.name, u.email,
                   lr.start_date, lr.end_date, lt.name AS leave_type
            FROM leave_requests lr
            INNER JOIN users u ON u.id = lr.user_id AND u.is_deleted = FALSE
            INNER JOIN leave_types lt ON lt.id = lr.leave_type_id AND lt.is_deleted = FALSE
            WHERE lr.status = 'Approved' AND lr.is_deleted = FALSE
              AND ? BETWEEN lr.start_date AND lr.end_date
            ORDER BY u.id
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OnLeaveToday {
                user_id: r.user_id,
                name: r.name,
                email: r.email,
                start_date: r.start_date,
                end_date: r.end_date,
                leave_type: r.leave_type,
            })
            .collect())
    }

    async fn team_leave(
        &self,
        user_ids: &[u64],
        month: u32,
        year: i32,
        role: Role,
    ) -> Result<Vec<LeaveRequestView>, StoreError> {
        let mut sql = format!(
            r#"{VIEW_SELECT}
            AND lr.status = 'Approved'
            AND MONTH(lr.start_date) = ? AND YEAR(lr.start_date) = ?
            "#
        );
        if role != Role::Admin {
            if user_ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; user_ids.len()].join(", ");
            sql.push_str(&format!(" AND lr.user_id IN ({placeholders})"));
        }
        sql.push_str(" ORDER BY lr.id");

        let mut query = sqlx::query_as::<_, ViewRow>(&sql).bind(month).bind(year);
        if role != Role::Admin {
            for id in user_ids {
                query = query.bind(id);
            }
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(LeaveRequestView::try_from).collect()
    }
}
