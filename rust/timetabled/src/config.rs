use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schedule::parse_hm;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// School-day constants used when generating or resetting a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayConvention {
    #[serde(with = "hhmm")]
    pub devotion_start: NaiveTime,
    pub devotion_minutes: i64,
    pub period_minutes: i64,
    pub periods_per_day: u32,
    pub break_minutes: i64,
    pub break_every: u32,
    /// New periods may not start at or after this time.
    #[serde(with = "hhmm")]
    pub latest_period_start: NaiveTime,
}

impl Default for DayConvention {
    fn default() -> Self {
        DayConvention {
            devotion_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            devotion_minutes: 15,
            period_minutes: 45,
            periods_per_day: 8,
            break_minutes: 20,
            break_every: 2,
            latest_period_start: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

impl DayConvention {
    pub fn break_count(&self) -> u32 {
        if self.break_every == 0 || self.periods_per_day == 0 {
            return 0;
        }
        (self.periods_per_day - 1) / self.break_every
    }

    fn day_span_minutes(&self) -> i64 {
        self.devotion_minutes
            + self.period_minutes * i64::from(self.periods_per_day)
            + self.break_minutes * i64::from(self.break_count())
    }

    fn validate(&self) -> Result<(), String> {
        let start = i64::from(minutes_of_day(self.devotion_start));
        if start + self.day_span_minutes() >= MINUTES_PER_DAY {
            return Err("school day must end before midnight".into());
        }
        if self.latest_period_start <= self.devotion_start {
            return Err("latestPeriodStart must be after devotionStart".into());
        }
        // Added periods start before the cutoff and must also end before midnight.
        if i64::from(minutes_of_day(self.latest_period_start)) + self.period_minutes
            > MINUTES_PER_DAY
        {
            return Err("latestPeriodStart leaves no room for a period before midnight".into());
        }
        Ok(())
    }

    /// Applies a partial update. On error `self` is left unchanged.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            match k.as_str() {
                "devotionStart" => next.devotion_start = parse_time(v, k)?,
                "latestPeriodStart" => next.latest_period_start = parse_time(v, k)?,
                "devotionMinutes" => next.devotion_minutes = parse_i64_range(v, k, 0, 120)?,
                "periodMinutes" => next.period_minutes = parse_i64_range(v, k, 5, 240)?,
                "breakMinutes" => next.break_minutes = parse_i64_range(v, k, 0, 120)?,
                "periodsPerDay" => next.periods_per_day = parse_i64_range(v, k, 1, 16)? as u32,
                "breakEvery" => next.break_every = parse_i64_range(v, k, 0, 16)? as u32,
                _ => return Err(format!("unknown timetable field: {}", k)),
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn minutes_of_day(t: NaiveTime) -> u32 {
    use chrono::Timelike;
    t.hour() * 60 + t.minute()
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_time(v: &Value, key: &str) -> Result<NaiveTime, String> {
    v.as_str()
        .and_then(parse_hm)
        .ok_or_else(|| format!("{} must be a HH:MM string", key))
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&crate::schedule::format_hm(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::schedule::parse_hm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {}", raw)))
    }
}
