use anyhow::Context;
use chrono::NaiveTime;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use crate::schedule::{format_hm, SchoolDay, SlotId};
use crate::timetable::Timetable;

const MISSING_SUBJECT: &str = "-";

/// Table data handed to the document renderer: one section (page) per weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub title: String,
    pub term: String,
    pub year: i32,
    pub sections: Vec<ExportSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSection {
    pub page: usize,
    pub day: SchoolDay,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Assembles rows in ascending start time and columns in roster order.
pub fn build_document(tt: &Timetable) -> ExportDocument {
    let classes: Vec<&str> = tt.class_names().collect();

    let mut header = vec!["Time".to_string(), "Period".to_string()];
    header.extend(classes.iter().map(|c| format!("{} Subject", c)));

    let sections = SchoolDay::ALL
        .iter()
        .enumerate()
        .map(|(i, day)| {
            // Classes may differ structurally after backfill; rows are the union.
            let mut rows: BTreeMap<(NaiveTime, SlotId), (NaiveTime, String)> = BTreeMap::new();
            for class in &classes {
                for s in tt.day_slots(class, *day).unwrap_or_default() {
                    rows.entry((s.start, s.id()))
                        .or_insert_with(|| (s.end, s.label()));
                }
            }

            let rows = rows
                .into_iter()
                .map(|((start, id), (end, label))| {
                    let mut row = vec![
                        format!("{}-{}", format_hm(start), format_hm(end)),
                        label,
                    ];
                    for class in &classes {
                        let subject = tt
                            .slot(class, *day, id)
                            .filter(|s| s.start == start)
                            .and_then(|s| s.subject())
                            .unwrap_or(MISSING_SUBJECT);
                        row.push(subject.to_string());
                    }
                    row
                })
                .collect();

            ExportSection {
                page: i + 1,
                day: *day,
                header: header.clone(),
                rows,
            }
        })
        .collect();

    ExportDocument {
        title: format!("Timetable {} {}", tt.key().term, tt.key().year),
        term: tt.key().term.clone(),
        year: tt.key().year,
        sections,
    }
}

/// Writes the document as pretty JSON and returns its SHA-256 hex digest.
/// The file appears only once fully written.
pub fn write_document(doc: &ExportDocument, out_path: &Path) -> anyhow::Result<String> {
    let bytes = serde_json::to_vec_pretty(doc).context("failed to serialize export document")?;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let mut partial = out_path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = Path::new(&partial);
    std::fs::write(partial, &bytes)
        .with_context(|| format!("failed to write {}", partial.to_string_lossy()))?;
    if let Err(e) = std::fs::rename(partial, out_path) {
        let _ = std::fs::remove_file(partial);
        return Err(e).with_context(|| {
            format!("failed to move export into {}", out_path.to_string_lossy())
        });
    }

    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DayConvention;
    use crate::timetable::TermKey;

    fn two_classes() -> Timetable {
        Timetable::generate(
            TermKey::new("Term 1", 2025),
            &["Grade 6".to_string(), "Grade 5".to_string()],
            &DayConvention::default(),
        )
    }

    #[test]
    fn sections_follow_weekdays_and_generator_order() {
        let mut tt = two_classes();
        tt.edit("Grade 5", SchoolDay::Monday, SlotId::Period(1), "Mathematics")
            .expect("edit");
        let doc = build_document(&tt);

        assert_eq!(doc.sections.len(), 5);
        assert_eq!(doc.sections[0].day, SchoolDay::Monday);
        assert_eq!(doc.sections[4].page, 5);

        let monday = &doc.sections[0];
        assert_eq!(
            monday.header,
            vec!["Time", "Period", "Grade 6 Subject", "Grade 5 Subject"]
        );
        assert_eq!(monday.rows.len(), 12);
        assert_eq!(monday.rows[0], vec!["07:00-07:15", "Devotion", "-", "-"]);
        assert_eq!(monday.rows[1], vec!["07:15-08:00", "Period 1", "-", "Mathematics"]);
        assert_eq!(monday.rows[3][1], "Break");
        assert_eq!(doc.sections[1].rows[1][3], "-");
    }

    #[test]
    fn rows_cover_structurally_different_classes() {
        let c = DayConvention::default();
        let mut tt = Timetable::generate(
            TermKey::new("Term 1", 2025),
            &["Grade 5".to_string()],
            &c,
        );
        tt.add_period(&c).expect("add");
        tt.backfill_class("Grade 6", &c);
        let doc = build_document(&tt);
        let last = doc.sections[2].rows.last().cloned().unwrap_or_default();
        assert_eq!(last, vec!["14:15-15:00", "Period 9", "-", "-"]);
        assert_eq!(doc.sections[2].rows.len(), 13);
    }

    #[test]
    fn write_document_replaces_target_and_hashes() {
        let dir = std::env::temp_dir().join(format!("timetabled-export-{}", uuid::Uuid::new_v4()));
        let out = dir.join("nested").join("timetable.json");
        let doc = build_document(&two_classes());
        let digest = write_document(&doc, &out).expect("write");
        assert_eq!(digest.len(), 64);

        let raw = std::fs::read(&out).expect("read back");
        assert_eq!(format!("{:x}", Sha256::digest(&raw)), digest);
        let v: serde_json::Value = serde_json::from_slice(&raw).expect("json");
        assert_eq!(v["sections"][0]["day"], "Monday");
        assert!(!dir.join("nested").join("timetable.json.partial").exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
