//! Next alert instant calculation.
//!
//! Alerts fire at the top of the hour. The hour the clock is currently in
//! counts as already passed, so `09:00:00` with hours `{9, 18}` yields
//! `18:00` the same day.

use crate::error::{AlfredError, Result};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Timelike};

/// Days past today to search when DST gaps swallow every candidate hour.
const LOOKAHEAD_DAYS: u64 = 2;

/// Earliest instant after `now` whose hour of day is in `hours`, with minutes,
/// seconds and sub-seconds zeroed.
///
/// Order and duplicates in `hours` do not matter. Local times that do not
/// exist (DST spring-forward) are skipped; ambiguous ones resolve to the
/// earlier instant.
///
/// # Errors
///
/// [`AlfredError::Configuration`] when `hours` is empty or contains a value
/// above 23.
pub fn next_alert<Tz, I>(now: &DateTime<Tz>, hours: I) -> Result<DateTime<Tz>>
where
    Tz: TimeZone,
    I: IntoIterator<Item = u8>,
{
    let mut sorted: Vec<u8> = hours.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let Some(&last) = sorted.last() else {
        return Err(AlfredError::Configuration(
            "no alert hours configured".to_owned(),
        ));
    };
    if last > 23 {
        return Err(AlfredError::Configuration(format!(
            "alert hour {last} is outside 0-23"
        )));
    }

    let tz = now.timezone();
    let today = now.date_naive();
    let current_hour = now.hour();

    let later_today = sorted
        .iter()
        .filter(|&&h| u32::from(h) > current_hour)
        .map(|&h| (today, h));
    let following_days = (1..=LOOKAHEAD_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .flat_map(|date| sorted.iter().map(move |&h| (date, h)));

    later_today
        .chain(following_days)
        .find_map(|(date, hour)| resolve(&tz, date, hour).filter(|at| at > now))
        .ok_or_else(|| {
            AlfredError::Configuration(format!("no representable alert instant after {now:?}"))
        })
}

fn resolve<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u8) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(u32::from(hour), 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}
