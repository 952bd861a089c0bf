//! # Slot Generation Engine
//!
//! Expands an owner's weekly availability rules into concrete, bookable UTC
//! instants over a calendar date range, minus anything excluded by ad-hoc
//! blocks or already-confirmed bookings.
//!
//! ## Algorithm
//!
//! 1. Interpret `from`/`to` as calendar dates in the owner's timezone; bad
//!    input or an inverted range yields an empty result, not an error.
//! 2. Walk each local calendar day in the range. A day's weekday index uses
//!    the stored convention 0 = Sunday through 6 = Saturday.
//! 3. For every enabled rule matching that weekday, step a cursor from
//!    `start_minute` in increments of the meeting duration. Slots are
//!    contiguous and back-to-back; a slot that would cross `end_minute` is
//!    dropped, never truncated.
//! 4. Convert each candidate's local start/end to UTC and drop it if its
//!    half-open interval overlaps any block or booking.
//! 5. Sort the survivors chronologically.
//!
//! Rules are defined in local wall-clock time and exclusions in UTC, so
//! cross-midnight and DST-boundary behavior comes entirely from the
//! timezone-aware conversion at the boundary. During a fall-back transition
//! an ambiguous wall-clock time resolves to the earlier instant; a
//! spring-forward gap has no instant on the rule grid, so the candidate is
//! skipped.
//!
//! The engine is a pure function over its inputs: no clock reads, no I/O,
//! no shared state.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::availability::AvailabilityRule;
use crate::models::slot::{Slot, UtcRange};

/// Inputs to one slot-generation run. `from` and `to` are inclusive
/// `YYYY-MM-DD` calendar dates interpreted in `timezone`.
#[derive(Debug, Clone)]
pub struct SlotQuery<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub timezone: &'a str,
    pub duration_minutes: i64,
    pub rules: &'a [AvailabilityRule],
    pub blocks: &'a [UtcRange],
    pub bookings: &'a [UtcRange],
}

/// Half-open interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Resolve a wall-clock offset (minutes past midnight of `date`) to a UTC
/// instant. Returns `None` when the wall-clock time falls in a DST gap.
fn minute_of_day_to_utc(tz: Tz, date: NaiveDate, minute: i64) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)? + Duration::minutes(minute);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// UTC instant at which the local calendar day `date` begins in `tz`.
///
/// A day whose midnight falls inside a DST gap starts at the first valid
/// instant after the gap.
pub fn local_day_start(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Expand weekly rules into candidate slots over `[from, to]`.
///
/// Bookings passed in are trusted to be pre-filtered to confirmed ones; the
/// engine itself is status-agnostic.
pub fn generate_slots(query: &SlotQuery<'_>) -> Vec<Slot> {
    let Ok(from) = NaiveDate::parse_from_str(query.from, "%Y-%m-%d") else {
        return Vec::new();
    };
    let Ok(to) = NaiveDate::parse_from_str(query.to, "%Y-%m-%d") else {
        return Vec::new();
    };
    let Ok(tz) = query.timezone.parse::<Tz>() else {
        return Vec::new();
    };
    if to < from || query.duration_minutes <= 0 {
        return Vec::new();
    }

    let mut slots = Vec::new();

    let mut day = from;
    loop {
        let day_of_week = day.weekday().num_days_from_sunday() as i16;

        for rule in query
            .rules
            .iter()
            .filter(|r| r.enabled && r.day_of_week == day_of_week)
        {
            let rule_end = i64::from(rule.end_minute);
            let mut minute = i64::from(rule.start_minute);

            while minute + query.duration_minutes <= rule_end {
                let starts_at = minute_of_day_to_utc(tz, day, minute);
                let ends_at = minute_of_day_to_utc(tz, day, minute + query.duration_minutes);

                if let (Some(starts_at), Some(ends_at)) = (starts_at, ends_at) {
                    let taken = query
                        .blocks
                        .iter()
                        .chain(query.bookings.iter())
                        .any(|range| overlaps(starts_at, ends_at, range.starts_at, range.ends_at));

                    if !taken {
                        slots.push(Slot { starts_at, ends_at });
                    }
                }

                minute += query.duration_minutes;
            }
        }

        if day == to {
            break;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    slots.sort_by_key(|slot| slot.starts_at);
    slots
}
