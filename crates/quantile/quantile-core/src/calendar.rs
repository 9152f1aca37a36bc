//! MMWR epidemiological weeks

use chrono::{Datelike, Duration, NaiveDate};
use quantile_spi::SeasonFlags;

/// MMWR (year, week) for a date.
///
/// Weeks run Sunday to Saturday. Week 1 of a year is the week containing
/// January 4, so the first and last few days of December and January can
/// belong to a neighbouring year.
pub fn mmwr_week(date: NaiveDate) -> (i32, u32) {
    let week_start = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    let year = (week_start + Duration::days(3)).year();
    let first_week_start = first_week_start(year);
    let week = (week_start - first_week_start).num_days() / 7 + 1;
    (year, week as u32)
}

/// Sunday starting MMWR week 1 of `year`.
fn first_week_start(year: i32) -> NaiveDate {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4).unwrap_or(NaiveDate::MIN);
    jan4 - Duration::days(i64::from(jan4.weekday().num_days_from_sunday()))
}

/// Season flags for the MMWR week containing `date`.
pub fn season_flags(date: NaiveDate) -> SeasonFlags {
    SeasonFlags::from_week(mmwr_week(date).1)
}
