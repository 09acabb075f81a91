//! Posting-slot schedule.
//!
//! Jobs are posted at fixed US-Eastern hours. Eastern time is treated as
//! a fixed UTC-5 offset; daylight saving is ignored.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::{ModelError, ModelResult};

/// Optimal posting hours, US Eastern (EST).
pub const OPTIMAL_EST_HOURS: [u32; 5] = [6, 10, 14, 18, 22];

/// Hours added to an EST hour to get the UTC hour.
pub const EST_OFFSET_HOURS: u32 = 5;

/// How far ahead a job may be scheduled.
pub const MAX_SCHEDULE_DAYS_AHEAD: i64 = 10;

/// All posting slots whose UTC hour is counted from midnight of `date`.
///
/// The 22:00 EST slot lands on 03:00 UTC of the following date.
pub fn slots_for_date(date: NaiveDate) -> Vec<DateTime<Utc>> {
    OPTIMAL_EST_HOURS
        .iter()
        .map(|hour| slot_on(date, *hour))
        .collect()
}

/// The next posting slot strictly after `now`.
pub fn next_slot(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    slots_for_date(today)
        .into_iter()
        .find(|slot| *slot > now)
        .unwrap_or_else(|| slot_on(today + Duration::days(1), OPTIMAL_EST_HOURS[0]))
}

/// Snap a requested time to the nearest posting hour on its UTC date.
///
/// Ties go to the earlier hour. Minutes and seconds are dropped.
pub fn snap_to_slot(requested: DateTime<Utc>) -> DateTime<Utc> {
    use chrono::Timelike;

    let est_hour = (requested.hour() + 24 - EST_OFFSET_HOURS) % 24;
    let closest = OPTIMAL_EST_HOURS
        .iter()
        .copied()
        .reduce(|best, hour| {
            if hour.abs_diff(est_hour) < best.abs_diff(est_hour) {
                hour
            } else {
                best
            }
        })
        .unwrap_or(OPTIMAL_EST_HOURS[0]);

    slot_on(requested.date_naive(), closest)
}

/// Last instant a job may be scheduled for, relative to `now`.
pub fn latest_allowed(now: DateTime<Utc>) -> DateTime<Utc> {
    let last_day = now.date_naive() + Duration::days(MAX_SCHEDULE_DAYS_AHEAD);
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    last_day.and_time(end_of_day).and_utc()
}

/// Resolve the posting time for a new job.
///
/// An explicit request is range-checked and snapped to a slot; without
/// one the next free slot is used.
pub fn resolve(requested: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ModelResult<DateTime<Utc>> {
    match requested {
        Some(at) => {
            if at > latest_allowed(now) {
                return Err(ModelError::ScheduleTooFar(MAX_SCHEDULE_DAYS_AHEAD));
            }
            Ok(snap_to_slot(at))
        }
        None => Ok(next_slot(now)),
    }
}

fn slot_on(date: NaiveDate, est_hour: u32) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(i64::from(est_hour + EST_OFFSET_HOURS))
}
