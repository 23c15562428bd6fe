//! Target-date arithmetic.
//!
//! All functions here are pure except [`random_historical_same_weekday`],
//! which draws from a caller-supplied RNG so tests can seed it.
//!
//! Weekdays are compared via `num_days_from_monday` (Monday = 0).

use chrono::{Datelike, Days, Months, NaiveDate};
use rand::Rng;
use thiserror::Error;

use crate::models::Period;

/// Preconditions of the random date generator were violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRangeError {
    #[error("start date {start} must be before reference date {reference}")]
    StartNotBeforeReference {
        start: NaiveDate,
        reference: NaiveDate,
    },

    #[error("date range {start}..{reference} too small to find a matching weekday")]
    NoMatchingWeek {
        start: NaiveDate,
        reference: NaiveDate,
    },
}

/// `reference` minus `n` days.
///
/// # Examples
///
/// ```ignore
/// let sunday = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
/// assert_eq!(offset_days_ago(sunday, 7), NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
/// ```
pub fn offset_days_ago(reference: NaiveDate, n: u64) -> NaiveDate {
    reference - Days::new(n)
}

/// Roughly one calendar month before `reference`, on the same weekday.
///
/// Goes back one month (clamping to the last day of shorter months), then
/// moves forward to the matching weekday; if that overshoots `reference`
/// it steps back a week. The result is always strictly before `reference`.
pub fn one_month_ago_same_weekday(reference: NaiveDate) -> NaiveDate {
    let candidate = reference
        .checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN);

    let diff = weekday_distance(candidate, reference);
    let result = candidate + Days::new(diff);

    if result > reference {
        result - Days::new(7)
    } else {
        result
    }
}

/// A uniformly random date in `[start, reference)` that shares
/// `reference`'s weekday.
///
/// # Errors
///
/// [`InvalidRangeError`] if `start >= reference`, or if no full week of the
/// matching weekday fits between them.
pub fn random_historical_same_weekday<R: Rng>(
    reference: NaiveDate,
    start: NaiveDate,
    rng: &mut R,
) -> Result<NaiveDate, InvalidRangeError> {
    if start >= reference {
        return Err(InvalidRangeError::StartNotBeforeReference { start, reference });
    }

    let first_valid = start + Days::new(weekday_distance(start, reference));
    if first_valid >= reference {
        return Err(InvalidRangeError::NoMatchingWeek { start, reference });
    }

    let weeks_between = (reference - first_valid).num_days() / 7;
    if weeks_between < 1 {
        return Err(InvalidRangeError::NoMatchingWeek { start, reference });
    }

    let week = rng.random_range(0..weeks_between) as u64;
    Ok(first_valid + Days::new(week * 7))
}

/// Resolve the day to search for `period`, relative to `reference`.
///
/// # Arguments
///
/// * `period` - The requested period.
/// * `reference` - Today, in local time.
/// * `random_start` - Earliest day [`Period::Random`] may land on.
/// * `rng` - Only drawn from for [`Period::Random`].
///
/// # Errors
///
/// Only the random period can fail; see [`random_historical_same_weekday`].
pub fn target_date<R: Rng>(
    period: Period,
    reference: NaiveDate,
    random_start: NaiveDate,
    rng: &mut R,
) -> Result<NaiveDate, InvalidRangeError> {
    match period {
        Period::OneWeek => Ok(offset_days_ago(reference, 7)),
        Period::TwoWeeks => Ok(offset_days_ago(reference, 14)),
        Period::OneMonth => Ok(one_month_ago_same_weekday(reference)),
        Period::Random => random_historical_same_weekday(reference, random_start, rng),
    }
}

/// Days to add to `from` to reach `to`'s weekday (0..=6).
fn weekday_distance(from: NaiveDate, to: NaiveDate) -> u64 {
    let from = from.weekday().num_days_from_monday();
    let to = to.weekday().num_days_from_monday();
    ((to + 7 - from) % 7) as u64
}
