use chrono::{Duration, NaiveTime};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

use crate::config::DayConvention;
use crate::error::TimetableError;
use crate::schedule::{format_hm, generate_week, SchoolDay, SlotId, SlotKind, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey {
    pub year: i32,
    pub term: String,
}

impl TermKey {
    pub fn new(term: impl Into<String>, year: i32) -> Self {
        TermKey {
            year,
            term: term.into(),
        }
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.term, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimetableStatus {
    Generated,
    Edited,
}

impl TimetableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TimetableStatus::Generated => "generated",
            TimetableStatus::Edited => "edited",
        }
    }
}

/// Stable per-timetable handle for a class; survives roster removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ClassHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotAddress {
    class: ClassHandle,
    day: SchoolDay,
    slot: SlotId,
}

#[derive(Debug, Clone)]
struct ClassEntry {
    handle: ClassHandle,
    name: String,
}

/// Result of a successful `add_period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodAddition {
    pub placements: usize,
    pub slots: Vec<(SlotId, NaiveTime, NaiveTime)>,
}

/// All weekly schedules for one (term, year).
///
/// Slots live in a flat table addressed by (class, day, slot id); each
/// (class, day) keeps its own ordering list.
#[derive(Debug, Clone)]
pub struct Timetable {
    id: Uuid,
    key: TermKey,
    status: TimetableStatus,
    classes: Vec<ClassEntry>,
    next_handle: u32,
    order: HashMap<(ClassHandle, SchoolDay), Vec<SlotId>>,
    slots: HashMap<SlotAddress, TimeSlot>,
}

impl Timetable {
    pub fn generate(key: TermKey, classes: &[String], convention: &DayConvention) -> Self {
        let mut tt = Timetable {
            id: Uuid::new_v4(),
            key,
            status: TimetableStatus::Generated,
            classes: Vec::with_capacity(classes.len()),
            next_handle: 0,
            order: HashMap::new(),
            slots: HashMap::new(),
        };
        for name in classes {
            tt.backfill_class(name, convention);
        }
        tt
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &TermKey {
        &self.key
    }

    pub fn status(&self) -> TimetableStatus {
        self.status
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }

    fn handle(&self, class: &str) -> Result<ClassHandle, TimetableError> {
        self.classes
            .iter()
            .find(|c| c.name == class)
            .map(|c| c.handle)
            .ok_or_else(|| TimetableError::UnknownClass(class.to_string()))
    }

    fn cells(&self) -> impl Iterator<Item = (ClassHandle, SchoolDay)> + '_ {
        self.classes
            .iter()
            .flat_map(|c| SchoolDay::ALL.into_iter().map(move |d| (c.handle, d)))
    }

    fn write_week(&mut self, handle: ClassHandle, convention: &DayConvention) {
        for day in generate_week(convention) {
            let ids = day.slots.iter().map(TimeSlot::id).collect();
            for slot in day.slots {
                let addr = SlotAddress {
                    class: handle,
                    day: day.day,
                    slot: slot.id(),
                };
                self.slots.insert(addr, slot);
            }
            self.order.insert((handle, day.day), ids);
        }
    }

    /// Adds a freshly generated week for a class not yet present. Existing
    /// classes are not touched.
    pub fn backfill_class(&mut self, name: &str, convention: &DayConvention) -> bool {
        if self.classes.iter().any(|c| c.name == name) {
            return false;
        }
        let handle = ClassHandle(self.next_handle);
        self.next_handle += 1;
        self.classes.push(ClassEntry {
            handle,
            name: name.to_string(),
        });
        self.write_week(handle, convention);
        true
    }

    pub fn remove_class(&mut self, name: &str) -> bool {
        let Ok(handle) = self.handle(name) else {
            return false;
        };
        self.classes.retain(|c| c.handle != handle);
        self.order.retain(|(h, _), _| *h != handle);
        self.slots.retain(|addr, _| addr.class != handle);
        true
    }

    pub fn day_slots(&self, class: &str, day: SchoolDay) -> Result<Vec<&TimeSlot>, TimetableError> {
        let handle = self.handle(class)?;
        Ok(self.day_slots_by_handle(handle, day))
    }

    fn day_slots_by_handle(&self, handle: ClassHandle, day: SchoolDay) -> Vec<&TimeSlot> {
        self.order
            .get(&(handle, day))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| {
                        self.slots.get(&SlotAddress {
                            class: handle,
                            day,
                            slot: *id,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn slot(&self, class: &str, day: SchoolDay, slot: SlotId) -> Option<&TimeSlot> {
        let handle = self.handle(class).ok()?;
        self.slots.get(&SlotAddress {
            class: handle,
            day,
            slot,
        })
    }

    /// Another class period of the same class and day already holding `subject`.
    fn conflicting_slot(
        &self,
        handle: ClassHandle,
        day: SchoolDay,
        slot: SlotId,
        subject: &str,
    ) -> Option<SlotId> {
        if subject.is_empty() {
            return None;
        }
        self.day_slots_by_handle(handle, day)
            .into_iter()
            .find(|s| s.id() != slot && s.subject() == Some(subject))
            .map(TimeSlot::id)
    }

    /// Whether `subject` may be placed in `slot` without repeating a subject
    /// within that class's day. Empty subjects are always allowed.
    pub fn can_assign(&self, class: &str, day: SchoolDay, slot: SlotId, subject: &str) -> bool {
        let Ok(handle) = self.handle(class) else {
            return true;
        };
        self.conflicting_slot(handle, day, slot, subject.trim())
            .is_none()
    }

    pub fn edit(
        &mut self,
        class: &str,
        day: SchoolDay,
        slot: SlotId,
        subject: &str,
    ) -> Result<&TimeSlot, TimetableError> {
        let subject = subject.trim();
        let handle = self.handle(class)?;
        let addr = SlotAddress {
            class: handle,
            day,
            slot,
        };
        match self.slots.get(&addr) {
            None => return Err(TimetableError::SlotNotFound(slot.to_string())),
            Some(s) if !s.editable() => return Err(TimetableError::SlotNotEditable(slot)),
            Some(_) => {}
        }
        if let Some(existing) = self.conflicting_slot(handle, day, slot, subject) {
            return Err(TimetableError::DuplicateSubject {
                class: class.to_string(),
                day,
                subject: subject.to_string(),
                existing,
            });
        }

        self.status = TimetableStatus::Edited;
        let Some(target) = self.slots.get_mut(&addr) else {
            return Err(TimetableError::SlotNotFound(slot.to_string()));
        };
        if let SlotKind::Class { subject: current, .. } = &mut target.kind {
            *current = if subject.is_empty() {
                None
            } else {
                Some(subject.to_string())
            };
        }
        Ok(&*target)
    }

    /// Appends one class period to every class/day, each starting where that
    /// day currently ends. Nothing is applied if any placement would start at
    /// or after the convention's latest period start.
    pub fn add_period(
        &mut self,
        convention: &DayConvention,
    ) -> Result<PeriodAddition, TimetableError> {
        let mut planned = Vec::new();
        for (handle, day) in self.cells() {
            let slots = self.day_slots_by_handle(handle, day);
            let start = slots
                .iter()
                .map(|s| s.end)
                .max()
                .unwrap_or(convention.devotion_start);
            if start >= convention.latest_period_start {
                return Err(TimetableError::PeriodOutOfBounds {
                    start: format_hm(start),
                    latest: format_hm(convention.latest_period_start),
                });
            }
            let number = slots
                .iter()
                .filter_map(|s| match s.kind {
                    SlotKind::Class { number, .. } => Some(number),
                    _ => None,
                })
                .max()
                .unwrap_or(0)
                + 1;
            let slot = TimeSlot {
                start,
                end: start + Duration::minutes(convention.period_minutes),
                kind: SlotKind::Class {
                    number,
                    subject: None,
                },
            };
            planned.push((handle, day, slot));
        }

        let mut distinct = BTreeSet::new();
        let placements = planned.len();
        for (handle, day, slot) in planned {
            let id = slot.id();
            distinct.insert((id, slot.start, slot.end));
            self.order.entry((handle, day)).or_default().push(id);
            self.slots.insert(
                SlotAddress {
                    class: handle,
                    day,
                    slot: id,
                },
                slot,
            );
        }
        if placements > 0 {
            self.status = TimetableStatus::Edited;
        }
        Ok(PeriodAddition {
            placements,
            slots: distinct.into_iter().collect(),
        })
    }

    /// Removes `slot` from every class and every day of this timetable.
    pub fn delete_period(&mut self, slot: SlotId) -> Result<usize, TimetableError> {
        let before = self.slots.len();
        self.slots.retain(|addr, _| addr.slot != slot);
        let removed = before - self.slots.len();
        if removed == 0 {
            return Err(TimetableError::SlotNotFound(slot.to_string()));
        }
        for ids in self.order.values_mut() {
            ids.retain(|id| *id != slot);
        }
        self.status = TimetableStatus::Edited;
        Ok(removed)
    }

    /// Clears every assignment and structural edit, keeping the class list.
    pub fn reset(&mut self, convention: &DayConvention) {
        self.order.clear();
        self.slots.clear();
        let handles: Vec<ClassHandle> = self.classes.iter().map(|c| c.handle).collect();
        for handle in handles {
            self.write_week(handle, convention);
        }
        self.status = TimetableStatus::Generated;
    }

    /// Periods per subject across the week, per class in roster order.
    pub fn subject_load(&self) -> Vec<(String, BTreeMap<String, usize>)> {
        self.classes
            .iter()
            .map(|c| {
                let mut load = BTreeMap::new();
                for day in SchoolDay::ALL {
                    for s in self.day_slots_by_handle(c.handle, day) {
                        if let Some(subject) = s.subject() {
                            *load.entry(subject.to_string()).or_insert(0) += 1;
                        }
                    }
                }
                (c.name.clone(), load)
            })
            .collect()
    }

    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "timetableId": self.id.to_string(),
            "term": self.key.term,
            "year": self.key.year,
            "status": self.status.as_str(),
            "classCount": self.classes.len(),
        })
    }

    pub fn day_json(&self, day: SchoolDay) -> serde_json::Value {
        let classes: Vec<serde_json::Value> = self
            .classes
            .iter()
            .map(|c| {
                let slots: Vec<serde_json::Value> = self
                    .day_slots_by_handle(c.handle, day)
                    .into_iter()
                    .map(TimeSlot::to_json)
                    .collect();
                json!({ "name": c.name, "slots": slots })
            })
            .collect();
        json!({ "day": day.as_str(), "classes": classes })
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut out = self.summary_json();
        out["days"] = serde_json::Value::Array(
            SchoolDay::ALL.iter().map(|d| self.day_json(*d)).collect(),
        );
        out
    }
}
