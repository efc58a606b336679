//! Work-day arithmetic for the min-time cutoff.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// The earliest instant a prior fire may have happened at and still block
/// `candidate`.
///
/// Walks back `work_days` days from the candidate's local date, skipping
/// Saturdays and Sundays, and returns `end_hour:00` on that date in `tz`.
/// With `work_days == 0` the candidate's own date is used.
pub fn no_fires_since(work_days: u32, candidate: DateTime<Utc>, end_hour: u32, tz: Tz) -> DateTime<Utc> {
    let mut date = candidate.with_timezone(&tz).date_naive();
    let mut remaining = work_days;
    while remaining > 0 {
        date = date.pred_opt().unwrap_or(NaiveDate::MIN);
        if !is_weekend(date.weekday()) {
            remaining -= 1;
        }
    }
    local_hour(date, end_hour, tz)
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// `hour:00` on `date` in `tz`. An hour skipped by a DST jump resolves to
/// the first instant after the gap; an hour of 24 is midnight of the next day.
fn local_hour(date: NaiveDate, hour: u32, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN) + Duration::hours(i64::from(hour));
    let resolved = tz
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest());
    match resolved {
        Some(t) => t.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::America::Los_Angeles;

    use super::*;

    fn la(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn two_work_days_before_thursday() {
        // 2015-12-17 was a Thursday.
        let cutoff = no_fires_since(2, la(2015, 12, 17, 11, 35), 15, Los_Angeles);
        assert_eq!(cutoff, la(2015, 12, 15, 15, 0));
    }

    #[test]
    fn monday_reaches_back_to_friday() {
        // 2016-06-13 was a Monday.
        let cutoff = no_fires_since(1, la(2016, 6, 13, 10, 0), 15, Los_Angeles);
        assert_eq!(cutoff, la(2016, 6, 10, 15, 0));
    }

    #[test]
    fn weekend_candidate_counts_friday() {
        // Sunday 2016-06-12: one work day back is Friday.
        let cutoff = no_fires_since(1, la(2016, 6, 12, 10, 0), 15, Los_Angeles);
        assert_eq!(cutoff, la(2016, 6, 10, 15, 0));
    }

    #[test]
    fn zero_days_is_same_day() {
        let cutoff = no_fires_since(0, la(2016, 6, 14, 10, 0), 15, Los_Angeles);
        assert_eq!(cutoff, la(2016, 6, 14, 15, 0));
    }

    #[test]
    fn local_date_not_utc_date() {
        // 2016-06-15 02:00 UTC is Tuesday evening in Los Angeles.
        let candidate = Utc.with_ymd_and_hms(2016, 6, 15, 2, 0, 0).unwrap();
        let cutoff = no_fires_since(1, candidate, 15, Los_Angeles);
        assert_eq!(cutoff, la(2016, 6, 13, 15, 0));
    }

    #[test]
    fn end_hour_in_dst_gap() {
        // 02:00 did not exist on 2016-03-13 in Los Angeles; 2016-03-14 is a Monday.
        let cutoff = no_fires_since(1, la(2016, 3, 15, 10, 0), 2, Los_Angeles);
        assert_eq!(cutoff, la(2016, 3, 14, 2, 0));
        let gap = no_fires_since(0, la(2016, 3, 13, 10, 0), 2, Los_Angeles);
        assert_eq!(gap, la(2016, 3, 13, 3, 0));
    }
}
