use serde_json::json;
use thiserror::Error;

use crate::schedule::{SchoolDay, SlotId};

/// A rejected timetable operation. Every variant leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    #[error("{subject} is already assigned to {existing} for {class} on {day}")]
    DuplicateSubject {
        class: String,
        day: SchoolDay,
        subject: String,
        existing: SlotId,
    },
    #[error("a new period would start at {start}, at or after {latest}")]
    PeriodOutOfBounds { start: String, latest: String },
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
    #[error("slot not found: {0}")]
    SlotNotFound(String),
    #[error("{0} is not a class period")]
    SlotNotEditable(SlotId),
    #[error("class already on roster: {0}")]
    DuplicateClass(String),
    #[error("export failed: {0}")]
    ExportFailed(String),
}

impl TimetableError {
    pub fn code(&self) -> &'static str {
        match self {
            TimetableError::DuplicateSubject { .. } => "duplicate_subject",
            TimetableError::PeriodOutOfBounds { .. } => "period_out_of_bounds",
            TimetableError::UnknownClass(_) => "unknown_class",
            TimetableError::UnknownSubject(_) => "unknown_subject",
            TimetableError::SlotNotFound(_) => "slot_not_found",
            TimetableError::SlotNotEditable(_) => "slot_not_editable",
            TimetableError::DuplicateClass(_) => "duplicate_class",
            TimetableError::ExportFailed(_) => "export_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            TimetableError::DuplicateSubject {
                class,
                day,
                subject,
                existing,
            } => Some(json!({
                "class": class,
                "day": day.as_str(),
                "subject": subject,
                "existingSlotId": existing,
            })),
            TimetableError::PeriodOutOfBounds { start, latest } => Some(json!({
                "start": start,
                "latestPeriodStart": latest,
            })),
            _ => None,
        }
    }
}
