//! Date-range conflict detection.

use chrono::NaiveDate;

use crate::store::LeaveStore;

use super::LeaveError;

/// Closed-interval intersection: both ranges are inclusive calendar dates.
pub fn ranges_intersect(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// True when the candidate range collides with any of the user's pending
/// or approved requests. Rejected and cancelled requests never block.
pub async fn has_overlap<S: LeaveStore + ?Sized>(
    store: &S,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<bool, LeaveError> {
    Ok(store.has_overlap(user_id, start_date, end_date).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn partial_overlap_intersects() {
        assert!(ranges_intersect(d(1), d(5), d(3), d(10)));
        assert!(ranges_intersect(d(3), d(10), d(1), d(5)));
    }

    #[test]
    fn containment_intersects() {
        assert!(ranges_intersect(d(1), d(10), d(4), d(6)));
        assert!(ranges_intersect(d(4), d(6), d(1), d(10)));
    }

    #[test]
    fn shared_boundary_day_intersects() {
        // Inclusive ranges: meeting on a single day is a conflict.
        assert!(ranges_intersect(d(1), d(5), d(5), d(8)));
        assert!(ranges_intersect(d(5), d(8), d(1), d(5)));
    }

    #[test]
    fn disjoint_ranges_do_not_intersect() {
        assert!(!ranges_intersect(d(1), d(4), d(5), d(8)));
        assert!(!ranges_intersect(d(5), d(8), d(1), d(4)));
    }
}
