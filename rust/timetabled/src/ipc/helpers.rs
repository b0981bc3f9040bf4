use serde_json::{json, Value as JsonValue};

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::schedule::{SchoolDay, SlotId};
use crate::timetable::TermKey;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// `subject` may be empty or null (clears the slot) but must be present.
pub fn subject_param(req: &Request) -> Result<String, serde_json::Value> {
    match req.params.get("subject") {
        None => Err(err(&req.id, "bad_params", "missing subject", None)),
        Some(v) if v.is_null() => Ok(String::new()),
        Some(v) => v
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| err(&req.id, "bad_params", "subject must be string or null", None)),
    }
}

pub fn term_key(req: &Request) -> Result<TermKey, serde_json::Value> {
    let term = required_str(req, "term")?;
    let year = req
        .params
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", "missing year", None))?;
    let year = i32::try_from(year)
        .ok()
        .filter(|y| (1900..=9999).contains(y))
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "year must be in 1900..=9999",
                Some(json!({ "year": year })),
            )
        })?;
    Ok(TermKey::new(term, year))
}

pub fn day(req: &Request) -> Result<SchoolDay, serde_json::Value> {
    let raw = required_str(req, "day")?;
    SchoolDay::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "day must be one of: Monday, Tuesday, Wednesday, Thursday, Friday",
            Some(json!({ "day": raw })),
        )
    })
}

pub fn slot_id(req: &Request) -> Result<SlotId, serde_json::Value> {
    let raw = required_str(req, "slotId")?;
    SlotId::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "slotId must be devotion, period-N or break-N",
            Some(json!({ "slotId": raw })),
        )
    })
}

pub fn parse_string_array(v: Option<&JsonValue>) -> Result<Vec<String>, &'static str> {
    match v {
        None => Ok(Vec::new()),
        Some(v) if v.is_null() => Ok(Vec::new()),
        Some(v) => {
            let arr = v.as_array().ok_or("must be array of strings")?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let s = item
                    .as_str()
                    .ok_or("must be array of strings")?
                    .trim()
                    .to_string();
                if !s.is_empty() {
                    out.push(s);
                }
            }
            Ok(out)
        }
    }
}
