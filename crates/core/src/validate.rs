//! Weekly availability validation: the gate between the editable weekly
//! model and persisted rule rows. Per-day invariant: enabled days carry
//! sorted, non-overlapping ranges with `start < end`. Disabled days are
//! exempt and contribute no rules.

use crate::errors::{SlotError, SlotResult};
use crate::models::availability::{AvailabilityRule, WeeklySchedule};

/// Parse an "HH:MM" wall-clock string into a minute-of-day offset.
/// Accepts `00:00` through `24:00`.
pub fn hhmm_to_minute(value: &str) -> Option<i32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    let minute = hours * 60 + minutes;
    (minute <= 24 * 60).then_some(minute)
}

/// Validate the weekly model and flatten it into persistable rule rows.
///
/// The returned rows atomically replace the owner's entire rule set; a
/// partial replacement is not a supported state, so any invalid day fails
/// the whole call with a `Validation` error naming that day.
pub fn validate_weekly(model: &WeeklySchedule) -> SlotResult<Vec<AvailabilityRule>> {
    let mut rules = Vec::new();

    for (day_of_week, day_key, day) in model.days.iter() {
        if !day.enabled {
            continue;
        }

        let mut ranges = Vec::with_capacity(day.ranges.len());
        for range in &day.ranges {
            let start = hhmm_to_minute(&range.start).ok_or_else(|| {
                SlotError::Validation(format!("Invalid time \"{}\" on {}", range.start, day_key))
            })?;
            let end = hhmm_to_minute(&range.end).ok_or_else(|| {
                SlotError::Validation(format!("Invalid time \"{}\" on {}", range.end, day_key))
            })?;
            ranges.push((start, end));
        }

        ranges.sort_by_key(|&(start, _)| start);

        for (i, &(start, end)) in ranges.iter().enumerate() {
            if start >= end {
                return Err(SlotError::Validation(format!("Invalid range on {day_key}")));
            }
            if i > 0 && start < ranges[i - 1].1 {
                return Err(SlotError::Validation(format!(
                    "Overlapping ranges on {day_key}"
                )));
            }
        }

        rules.extend(ranges.into_iter().map(|(start, end)| AvailabilityRule {
            day_of_week,
            start_minute: start,
            end_minute: end,
            enabled: true,
        }));
    }

    Ok(rules)
}
