use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use std::fmt;

use crate::config::DayConvention;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchoolDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Monday,
        SchoolDay::Tuesday,
        SchoolDay::Wednesday,
        SchoolDay::Thursday,
        SchoolDay::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolDay::Monday => "Monday",
            SchoolDay::Tuesday => "Tuesday",
            SchoolDay::Wednesday => "Wednesday",
            SchoolDay::Thursday => "Thursday",
            SchoolDay::Friday => "Friday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Some(SchoolDay::Monday),
            "tuesday" | "tue" => Some(SchoolDay::Tuesday),
            "wednesday" | "wed" => Some(SchoolDay::Wednesday),
            "thursday" | "thu" => Some(SchoolDay::Thursday),
            "friday" | "fri" => Some(SchoolDay::Friday),
            _ => None,
        }
    }
}

impl fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable slot identifier. Renders as `devotion`, `period-N` or `break-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Devotion,
    Period(u32),
    Break(u32),
}

impl SlotId {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "devotion" {
            return Some(SlotId::Devotion);
        }
        if let Some(n) = s.strip_prefix("period-") {
            return n.parse::<u32>().ok().filter(|n| *n > 0).map(SlotId::Period);
        }
        if let Some(n) = s.strip_prefix("break-") {
            return n.parse::<u32>().ok().filter(|n| *n > 0).map(SlotId::Break);
        }
        None
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Devotion => f.write_str("devotion"),
            SlotId::Period(n) => write!(f, "period-{}", n),
            SlotId::Break(n) => write!(f, "break-{}", n),
        }
    }
}

impl Serialize for SlotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What occupies a slot. Only class periods carry a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKind {
    Devotion,
    Class { number: u32, subject: Option<String> },
    Break { number: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub kind: SlotKind,
}

impl TimeSlot {
    pub fn id(&self) -> SlotId {
        match self.kind {
            SlotKind::Devotion => SlotId::Devotion,
            SlotKind::Class { number, .. } => SlotId::Period(number),
            SlotKind::Break { number } => SlotId::Break(number),
        }
    }

    pub fn editable(&self) -> bool {
        matches!(self.kind, SlotKind::Class { .. })
    }

    pub fn subject(&self) -> Option<&str> {
        match &self.kind {
            SlotKind::Class { subject, .. } => subject.as_deref(),
            _ => None,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            SlotKind::Devotion => "devotion",
            SlotKind::Class { .. } => "class",
            SlotKind::Break { .. } => "break",
        }
    }

    pub fn label(&self) -> String {
        match self.kind {
            SlotKind::Devotion => "Devotion".to_string(),
            SlotKind::Class { number, .. } => format!("Period {}", number),
            SlotKind::Break { .. } => "Break".to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id(),
            "kind": self.kind_str(),
            "start": format_hm(self.start),
            "end": format_hm(self.end),
            "label": self.label(),
            "subject": self.subject(),
            "editable": self.editable(),
        })
    }
}

/// One weekday's ordered slots for a single class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: SchoolDay,
    pub slots: Vec<TimeSlot>,
}

pub fn format_hm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_hm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Builds one class's slots for one day: devotion, then the class periods with a
/// break after every `break_every`-th period except the last.
pub fn generate_day(convention: &DayConvention) -> Vec<TimeSlot> {
    let mut slots = Vec::with_capacity(
        1 + convention.periods_per_day as usize + convention.break_count() as usize,
    );

    let mut cursor = convention.devotion_start;
    let devotion_end = cursor + Duration::minutes(convention.devotion_minutes);
    slots.push(TimeSlot {
        start: cursor,
        end: devotion_end,
        kind: SlotKind::Devotion,
    });
    cursor = devotion_end;

    let mut breaks = 0;
    for number in 1..=convention.periods_per_day {
        let end = cursor + Duration::minutes(convention.period_minutes);
        slots.push(TimeSlot {
            start: cursor,
            end,
            kind: SlotKind::Class {
                number,
                subject: None,
            },
        });
        cursor = end;

        if convention.break_every > 0
            && number % convention.break_every == 0
            && number < convention.periods_per_day
        {
            breaks += 1;
            let end = cursor + Duration::minutes(convention.break_minutes);
            slots.push(TimeSlot {
                start: cursor,
                end,
                kind: SlotKind::Break { number: breaks },
            });
            cursor = end;
        }
    }
    slots
}

pub fn generate_week(convention: &DayConvention) -> Vec<DaySchedule> {
    SchoolDay::ALL
        .iter()
        .map(|day| DaySchedule {
            day: *day,
            slots: generate_day(convention),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(s: &str) -> NaiveTime {
        parse_hm(s).expect("valid time")
    }

    #[test]
    fn default_day_has_twelve_contiguous_slots() {
        let slots = generate_day(&DayConvention::default());
        assert_eq!(slots.len(), 12);
        for pair in slots.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[1].start);
        }
        assert_eq!(slots[0].id(), SlotId::Devotion);
        assert_eq!(slots[0].start, hm("07:00"));
        assert_eq!(slots[0].end, hm("07:15"));
        assert_eq!(slots[1].id(), SlotId::Period(1));
        assert_eq!(slots[1].end, hm("08:00"));
        assert_eq!(slots.last().map(|s| s.end), Some(hm("14:15")));
    }

    #[test]
    fn breaks_follow_even_periods_except_last() {
        let ids: Vec<String> = generate_day(&DayConvention::default())
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "devotion", "period-1", "period-2", "break-1", "period-3", "period-4",
                "break-2", "period-5", "period-6", "break-3", "period-7", "period-8",
            ]
        );
        let slots = generate_day(&DayConvention::default());
        let b1 = &slots[3];
        assert_eq!(b1.start, hm("08:45"));
        assert_eq!(b1.end, hm("09:05"));
        assert!(!b1.editable());
    }

    #[test]
    fn generation_is_deterministic() {
        let c = DayConvention::default();
        assert_eq!(generate_day(&c), generate_day(&c));
        let week = generate_week(&c);
        assert_eq!(week.len(), 5);
        assert_eq!(week[0].day, SchoolDay::Monday);
        assert_eq!(week[4].day, SchoolDay::Friday);
    }

    #[test]
    fn slot_ids_parse_and_render() {
        assert_eq!(SlotId::parse("period-12"), Some(SlotId::Period(12)));
        assert_eq!(SlotId::parse("break-2"), Some(SlotId::Break(2)));
        assert_eq!(SlotId::parse("devotion"), Some(SlotId::Devotion));
        assert_eq!(SlotId::parse("period-0"), None);
        assert_eq!(SlotId::parse("lunch"), None);
        assert_eq!(SlotId::Period(3).to_string(), "period-3");
        assert_eq!(SchoolDay::parse("WEDNESDAY"), Some(SchoolDay::Wednesday));
        assert_eq!(SchoolDay::parse("Saturday"), None);
    }
}
