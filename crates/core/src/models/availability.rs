use serde::{Deserialize, Serialize};

/// A persisted weekly availability rule. `day_of_week` uses 0 = Sunday
/// through 6 = Saturday; this encoding is part of the stored format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub day_of_week: i16,
    pub start_minute: i32,
    pub end_minute: i32,
    pub enabled: bool,
}

/// One wall-clock range inside a day, as "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

/// The editable weekly availability model exchanged with clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: WeekDays,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekDays {
    pub sun: DaySchedule,
    pub mon: DaySchedule,
    pub tue: DaySchedule,
    pub wed: DaySchedule,
    pub thu: DaySchedule,
    pub fri: DaySchedule,
    pub sat: DaySchedule,
}

impl WeekDays {
    /// Days in stored order; the index position is the persisted `day_of_week`.
    pub fn iter(&self) -> impl Iterator<Item = (i16, &'static str, &DaySchedule)> {
        [
            &self.sun, &self.mon, &self.tue, &self.wed, &self.thu, &self.fri, &self.sat,
        ]
        .into_iter()
        .enumerate()
        .map(|(dow, day)| (dow as i16, DAY_KEYS[dow], day))
    }

    fn day_mut(&mut self, day_of_week: i16) -> Option<&mut DaySchedule> {
        match day_of_week {
            0 => Some(&mut self.sun),
            1 => Some(&mut self.mon),
            2 => Some(&mut self.tue),
            3 => Some(&mut self.wed),
            4 => Some(&mut self.thu),
            5 => Some(&mut self.fri),
            6 => Some(&mut self.sat),
            _ => None,
        }
    }
}

pub const DAY_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

impl WeeklySchedule {
    /// Rebuild the editable weekly model from persisted rule rows.
    /// Rows with an out-of-range `day_of_week` are ignored.
    pub fn from_rules(rules: &[AvailabilityRule]) -> Self {
        let mut weekly = WeeklySchedule::default();
        for rule in rules {
            let Some(day) = weekly.days.day_mut(rule.day_of_week) else {
                continue;
            };
            day.enabled = day.enabled || rule.enabled;
            day.ranges.push(TimeRange {
                start: minute_to_hhmm(rule.start_minute),
                end: minute_to_hhmm(rule.end_minute),
            });
        }
        weekly
    }
}

/// Format a minute-of-day offset as a zero-padded "HH:MM" string.
pub fn minute_to_hhmm(minute: i32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
