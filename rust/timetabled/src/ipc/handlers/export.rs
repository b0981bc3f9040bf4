use crate::error::TimetableError;
use crate::export::{build_document, write_document};
use crate::ipc::error::{err, ok, rejected};
use crate::ipc::helpers::term_key;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let out_path = match req.params.get("outPath") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => match v.as_str().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(PathBuf::from(s)),
            None => return err(&req.id, "bad_params", "outPath must be a non-empty string", None),
        },
    };

    let doc = build_document(state.store.open(&key));
    let document = match serde_json::to_value(&doc) {
        Ok(v) => v,
        Err(e) => return rejected(&req.id, &TimetableError::ExportFailed(e.to_string())),
    };

    let Some(path) = out_path else {
        return ok(&req.id, json!({ "document": document }));
    };
    match write_document(&doc, &path) {
        Ok(sha256) => {
            info!(key = %key, path = %path.display(), "timetable exported");
            ok(
                &req.id,
                json!({
                    "document": document,
                    "outPath": path.to_string_lossy(),
                    "sha256": sha256,
                }),
            )
        }
        Err(e) => {
            warn!(key = %key, path = %path.display(), "export failed: {e:#}");
            rejected(&req.id, &TimetableError::ExportFailed(format!("{e:#}")))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetables.export" => Some(handle_export(state, req)),
        _ => None,
    }
}
