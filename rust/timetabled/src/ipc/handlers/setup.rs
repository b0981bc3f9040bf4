use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let timetable = match serde_json::to_value(state.store.convention()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    ok(&req.id, json!({ "timetable": timetable }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(section) = req.params.get("section").and_then(|v| v.as_str()) {
        if section != "timetable" {
            return err(&req.id, "bad_params", "unknown section", None);
        }
    }
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut next = state.store.convention().clone();
    if let Err(msg) = next.merge_patch(patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    state.store.set_convention(next);
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
