use chrono::NaiveDate;

/// Consecutive-day login counter.
///
/// Compares calendar dates only: a second login on the same day changes
/// nothing, a login exactly one day after the last activity extends the
/// streak, and any other gap (or a first-ever login) restarts it at 1.
pub fn next_streak(last_activity: Option<NaiveDate>, today: NaiveDate, current: i32) -> i32 {
    match last_activity {
        Some(last) => {
            let gap = (today - last).num_days();
            if gap == 0 {
                current
            } else if gap == 1 {
                current + 1
            } else {
                1
            }
        }
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn same_day_keeps_streak() {
        assert_eq!(next_streak(Some(d(2025, 3, 10)), d(2025, 3, 10), 4), 4);
    }

    #[test]
    fn next_day_increments() {
        assert_eq!(next_streak(Some(d(2025, 3, 10)), d(2025, 3, 11), 4), 5);
    }

    #[test]
    fn gap_resets() {
        assert_eq!(next_streak(Some(d(2025, 3, 10)), d(2025, 3, 13), 4), 1);
    }

    #[test]
    fn first_login_starts_at_one() {
        assert_eq!(next_streak(None, d(2025, 3, 10), 0), 1);
    }

    #[test]
    fn month_boundary_counts_as_one_day() {
        assert_eq!(next_streak(Some(d(2025, 2, 28)), d(2025, 3, 1), 9), 10);
    }
}
