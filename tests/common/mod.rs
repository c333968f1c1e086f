use chrono::NaiveDate;
use rust_decimal::Decimal;

use leave_engine::leave::{ledger, lifecycle::SubmitLeave};
use leave_engine::model::user::Role;
use leave_engine::store::{LeaveStore, MemStore, seed};

/// All fixture requests land in this year.
#[allow(dead_code)]
pub const YEAR: i32 = 2025;

/// A four-level reporting chain (employee -> manager -> hr -> admin) with
/// the default leave-type catalogue and fully provisioned balances.
#[allow(dead_code)]
pub struct Org {
    pub store: MemStore,
    pub admin: u64,
    pub hr: u64,
    pub manager: u64,
    pub employee: u64,
    pub casual: u64,
    pub sick: u64,
    pub paid: u64,
    pub maternity: u64,
    pub emergency: u64,
    pub loss_of_pay: u64,
}

pub async fn setup() -> Org {
    let store = MemStore::new();

    let admin = store.add_user("Ava Admin", "ava@corp.test", Role::Admin, None);
    let hr = store.add_user("Hana Hr", "hana@corp.test", Role::Hr, Some(admin));
    let manager = store.add_user("Mia Manager", "mia@corp.test", Role::Manager, Some(hr));
    let employee = store.add_user("Eli Employee", "eli@corp.test", Role::Employee, Some(manager));

    let mut type_ids = Vec::new();
    for new_type in seed::default_leave_types() {
        type_ids.push(store.insert_leave_type(new_type).await.unwrap());
    }

    for user in [admin, hr, manager, employee] {
        ledger::provision_for_user(&store, user, YEAR).await.unwrap();
    }

    Org {
        store,
        admin,
        hr,
        manager,
        employee,
        casual: type_ids[0],
        sick: type_ids[1],
        paid: type_ids[2],
        maternity: type_ids[3],
        emergency: type_ids[5],
        loss_of_pay: type_ids[6],
    }
}

#[allow(dead_code)]
pub fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(YEAR, month, day).unwrap()
}

/// Full-day request helper; `days` must match the inclusive date range the
/// caller picked.
#[allow(dead_code)]
pub fn leave(
    user_id: u64,
    leave_type_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    days: i64,
) -> SubmitLeave {
    SubmitLeave {
        user_id,
        leave_type_id,
        start_date: start,
        end_date: end,
        is_half_day: false,
        half_day_type: None,
        reason: "time off".to_string(),
        total_days: Decimal::from(days),
    }
}

/// (balance, used) for one account, panicking when the row is missing.
#[allow(dead_code)]
pub async fn account(
    store: &MemStore,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
) -> (Decimal, Decimal) {
    let row = store
        .get_balance(user_id, leave_type_id, year)
        .await
        .unwrap()
        .expect("balance row should exist");
    (row.balance, row.used)
}
