use crate::ipc::error::{err, ok, rejected};
use crate::ipc::helpers::{parse_string_array, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_roster_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = state.store.roster();
    ok(
        &req.id,
        json!({
            "classes": roster.classes(),
            "subjects": roster.subjects(),
        }),
    )
}

fn handle_roster_add_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.add_class(&name) {
        Ok(backfilled) => ok(
            &req.id,
            json!({
                "classes": state.store.roster().classes(),
                "backfilled": backfilled,
            }),
        ),
        Err(e) => rejected(&req.id, &e),
    }
}

fn handle_roster_remove_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.remove_class(&name) {
        Ok(removed) => ok(
            &req.id,
            json!({
                "classes": state.store.roster().classes(),
                "removed": removed,
            }),
        ),
        Err(e) => rejected(&req.id, &e),
    }
}

fn handle_roster_set_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    if req.params.get("subjects").is_none() {
        return err(&req.id, "bad_params", "missing subjects", None);
    }
    let subjects = match parse_string_array(req.params.get("subjects")) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", format!("subjects {}", msg), None),
    };
    state.store.set_subjects(subjects);
    ok(
        &req.id,
        json!({ "subjects": state.store.roster().subjects() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.get" => Some(handle_roster_get(state, req)),
        "roster.addClass" => Some(handle_roster_add_class(state, req)),
        "roster.removeClass" => Some(handle_roster_remove_class(state, req)),
        "roster.setSubjects" => Some(handle_roster_set_subjects(state, req)),
        _ => None,
    }
}
