// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar windows.
//!
//! Timestamps are stored as RFC3339 UTC strings with a fixed millisecond
//! fraction, so string order and chronological order agree.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 with milliseconds and a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Midnight at the start of `date` in `tz`.
///
/// If midnight does not exist (DST gap), the UTC interpretation is used.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Most recent Monday at 00:00 in `now`'s time zone.
///
/// Sunday counts as the last day of the week that began six days earlier.
pub fn start_of_week<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_from_monday);
    local_midnight(&now.timezone(), monday)
}

/// First day of `now`'s calendar month at 00:00.
pub fn start_of_month<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    local_midnight(&now.timezone(), first)
}

/// Today at 00:00.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    local_midnight(&now.timezone(), now.date_naive())
}

/// Boundaries used by the statistics endpoints, resolved to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindows {
    /// Monday 00:00 local of the current week.
    pub week_start: DateTime<Utc>,
    /// First of the month 00:00 local.
    pub month_start: DateTime<Utc>,
    /// Today 00:00 local.
    pub day_start: DateTime<Utc>,
    /// `now - 7 days`, not aligned to any calendar boundary.
    pub rolling_week_start: DateTime<Utc>,
}

impl CalendarWindows {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            week_start: start_of_week(now).with_timezone(&Utc),
            month_start: start_of_month(now).with_timezone(&Utc),
            day_start: start_of_day(now).with_timezone(&Utc),
            rolling_week_start: (now.clone() - Duration::days(7)).with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_format_has_fixed_millis() {
        let date = utc(2025, 1, 6, 0, 0, 0);
        assert_eq!(format_utc_rfc3339(date), "2025-01-06T00:00:00.000Z");
        assert_eq!(parse_utc_rfc3339("2025-01-06T00:00:00.000Z"), Some(date));
    }

    #[test]
    fn test_start_of_week_midweek() {
        // Wednesday 2025-01-08
        let now = utc(2025, 1, 8, 15, 30, 0);
        assert_eq!(start_of_week(&now), utc(2025, 1, 6, 0, 0, 0));
    }

    #[test]
    fn test_start_of_week_on_monday_is_same_day() {
        let now = utc(2025, 1, 6, 0, 0, 1);
        assert_eq!(start_of_week(&now), utc(2025, 1, 6, 0, 0, 0));
    }

    #[test]
    fn test_sunday_belongs_to_previous_monday() {
        // Sunday 2025-01-12 23:59:59
        let now = utc(2025, 1, 12, 23, 59, 59);
        assert_eq!(start_of_week(&now), utc(2025, 1, 6, 0, 0, 0));
    }

    #[test]
    fn test_start_of_week_crosses_month() {
        // Saturday 2025-03-01 -> Monday 2025-02-24
        let now = utc(2025, 3, 1, 9, 0, 0);
        assert_eq!(start_of_week(&now), utc(2025, 2, 24, 0, 0, 0));
    }

    #[test]
    fn test_start_of_week_uses_local_offset() {
        // Monday 01:00 at UTC+9 is still Sunday in UTC.
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 1, 13, 1, 0, 0).unwrap();
        let start = start_of_week(&now);
        assert_eq!(start, tz.with_ymd_and_hms(2025, 1, 13, 0, 0, 0).unwrap());
        assert_eq!(start.with_timezone(&Utc), utc(2025, 1, 12, 15, 0, 0));
    }

    #[test]
    fn test_start_of_month_and_day() {
        let now = utc(2025, 2, 17, 8, 45, 0);
        assert_eq!(start_of_month(&now), utc(2025, 2, 1, 0, 0, 0));
        assert_eq!(start_of_day(&now), utc(2025, 2, 17, 0, 0, 0));
    }

    #[test]
    fn test_rolling_week_is_not_aligned() {
        let now = utc(2025, 1, 8, 15, 30, 0);
        let windows = CalendarWindows::at(&now);
        assert_eq!(windows.rolling_week_start, utc(2025, 1, 1, 15, 30, 0));
        assert_ne!(windows.rolling_week_start, windows.week_start);
    }
}
