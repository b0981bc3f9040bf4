use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::DayConvention;
use crate::error::TimetableError;
use crate::schedule::{SchoolDay, SlotId, TimeSlot};
use crate::timetable::{PeriodAddition, TermKey, Timetable};

/// Ordered classes and subjects known to the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    classes: Vec<String>,
    subjects: Vec<String>,
}

impl Roster {
    pub fn new(classes: Vec<String>, subjects: Vec<String>) -> Self {
        Roster {
            classes: dedup_trimmed(classes),
            subjects: dedup_trimmed(subjects),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// An empty subject list accepts any subject.
    fn knows_subject(&self, subject: &str) -> bool {
        self.subjects.is_empty() || self.subjects.iter().any(|s| s == subject)
    }
}

fn dedup_trimmed(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Owns every timetable of the session, keyed by (term, year).
#[derive(Debug, Default)]
pub struct TimetableStore {
    convention: DayConvention,
    roster: Roster,
    timetables: BTreeMap<TermKey, Timetable>,
}

impl TimetableStore {
    pub fn new(convention: DayConvention, roster: Roster) -> Self {
        TimetableStore {
            convention,
            roster,
            timetables: BTreeMap::new(),
        }
    }

    pub fn convention(&self) -> &DayConvention {
        &self.convention
    }

    /// Takes effect for timetables generated or reset afterwards.
    pub fn set_convention(&mut self, convention: DayConvention) {
        info!(?convention, "day convention updated");
        self.convention = convention;
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.timetables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timetables.is_empty()
    }

    /// Appends a class and backfills it into every existing timetable.
    /// Returns how many timetables were backfilled.
    pub fn add_class(&mut self, name: &str) -> Result<usize, TimetableError> {
        let name = name.trim();
        if self.roster.classes.iter().any(|c| c == name) {
            return Err(TimetableError::DuplicateClass(name.to_string()));
        }
        self.roster.classes.push(name.to_string());
        let mut backfilled = 0;
        for tt in self.timetables.values_mut() {
            if tt.backfill_class(name, &self.convention) {
                backfilled += 1;
            }
        }
        info!(class = name, backfilled, "class added to roster");
        Ok(backfilled)
    }

    /// Removes a class from the roster and drops its schedules.
    pub fn remove_class(&mut self, name: &str) -> Result<usize, TimetableError> {
        let name = name.trim();
        let Some(pos) = self.roster.classes.iter().position(|c| c == name) else {
            return Err(TimetableError::UnknownClass(name.to_string()));
        };
        self.roster.classes.remove(pos);
        let mut removed = 0;
        for tt in self.timetables.values_mut() {
            if tt.remove_class(name) {
                removed += 1;
            }
        }
        info!(class = name, removed, "class removed from roster");
        Ok(removed)
    }

    pub fn set_subjects(&mut self, subjects: Vec<String>) {
        self.roster.subjects = dedup_trimmed(subjects);
        info!(count = self.roster.subjects.len(), "subject list replaced");
    }

    pub fn get(&self, key: &TermKey) -> Option<&Timetable> {
        self.timetables.get(key)
    }

    /// Returns the timetable for `key`, generating it on first reference.
    pub fn open(&mut self, key: &TermKey) -> &mut Timetable {
        let TimetableStore {
            convention,
            roster,
            timetables,
        } = self;
        timetables.entry(key.clone()).or_insert_with(|| {
            let tt = Timetable::generate(key.clone(), &roster.classes, convention);
            info!(key = %key, id = %tt.id(), "timetable generated");
            tt
        })
    }

    pub fn list(&self) -> impl Iterator<Item = &Timetable> {
        self.timetables.values()
    }

    pub fn can_assign(
        &mut self,
        key: &TermKey,
        class: &str,
        day: SchoolDay,
        slot: SlotId,
        subject: &str,
    ) -> bool {
        self.open(key).can_assign(class, day, slot, subject)
    }

    pub fn edit(
        &mut self,
        key: &TermKey,
        class: &str,
        day: SchoolDay,
        slot: SlotId,
        subject: &str,
    ) -> Result<TimeSlot, TimetableError> {
        let subject = subject.trim();
        if !subject.is_empty() && !self.roster.knows_subject(subject) {
            warn!(key = %key, subject, "edit rejected: unknown subject");
            return Err(TimetableError::UnknownSubject(subject.to_string()));
        }
        match self.open(key).edit(class, day, slot, subject) {
            Ok(s) => {
                debug!(key = %key, class, %day, %slot, subject, "slot edited");
                Ok(s.clone())
            }
            Err(e) => {
                warn!(key = %key, class, %day, %slot, code = e.code(), "edit rejected: {e}");
                Err(e)
            }
        }
    }

    pub fn add_period(&mut self, key: &TermKey) -> Result<PeriodAddition, TimetableError> {
        let convention = self.convention.clone();
        match self.open(key).add_period(&convention) {
            Ok(a) => {
                info!(key = %key, placements = a.placements, "period added");
                Ok(a)
            }
            Err(e) => {
                warn!(key = %key, code = e.code(), "add period rejected: {e}");
                Err(e)
            }
        }
    }

    pub fn delete_period(&mut self, key: &TermKey, slot: SlotId) -> Result<usize, TimetableError> {
        match self.open(key).delete_period(slot) {
            Ok(removed) => {
                info!(key = %key, %slot, removed, "period deleted");
                Ok(removed)
            }
            Err(e) => {
                warn!(key = %key, %slot, code = e.code(), "delete period rejected: {e}");
                Err(e)
            }
        }
    }

    pub fn reset(&mut self, key: &TermKey) -> &Timetable {
        let convention = self.convention.clone();
        let tt = self.open(key);
        tt.reset(&convention);
        info!(key = %key, "timetable reset");
        tt
    }

    /// Removes the timetable. Returns whether one existed.
    pub fn delete(&mut self, key: &TermKey) -> bool {
        let existed = self.timetables.remove(key).is_some();
        if existed {
            info!(key = %key, "timetable deleted");
        }
        existed
    }
}
