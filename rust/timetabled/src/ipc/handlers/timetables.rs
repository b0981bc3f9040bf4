use crate::ipc::error::{ok, rejected};
use crate::ipc::helpers::{day, required_str, slot_id, subject_param, term_key};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{format_hm, SchoolDay, SlotId};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let timetables: Vec<serde_json::Value> =
        state.store.list().map(|tt| tt.summary_json()).collect();
    ok(&req.id, json!({ "timetables": timetables }))
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, state.store.open(&key).to_json())
}

fn handle_day(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let day = match day(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, state.store.open(&key).day_json(day))
}

struct SlotTarget {
    class: String,
    day: SchoolDay,
    slot: SlotId,
    subject: String,
}

fn slot_target(req: &Request) -> Result<SlotTarget, serde_json::Value> {
    Ok(SlotTarget {
        class: required_str(req, "class")?,
        day: day(req)?,
        slot: slot_id(req)?,
        subject: subject_param(req)?,
    })
}

fn handle_can_assign(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let t = match slot_target(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let allowed = state
        .store
        .can_assign(&key, &t.class, t.day, t.slot, &t.subject);
    ok(&req.id, json!({ "allowed": allowed }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let t = match slot_target(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.edit(&key, &t.class, t.day, t.slot, &t.subject) {
        Ok(slot) => ok(&req.id, json!({ "slot": slot.to_json() })),
        Err(e) => rejected(&req.id, &e),
    }
}

fn handle_add_period(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.add_period(&key) {
        Ok(added) => {
            let slots: Vec<serde_json::Value> = added
                .slots
                .iter()
                .map(|(id, start, end)| {
                    json!({ "slotId": id, "start": format_hm(*start), "end": format_hm(*end) })
                })
                .collect();
            ok(
                &req.id,
                json!({ "placements": added.placements, "slots": slots }),
            )
        }
        Err(e) => rejected(&req.id, &e),
    }
}

fn handle_delete_period(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let slot = match slot_id(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.store.delete_period(&key, slot) {
        Ok(removed) => ok(&req.id, json!({ "slotId": slot, "removed": removed })),
        Err(e) => rejected(&req.id, &e),
    }
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, state.store.reset(&key).to_json())
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!({ "deleted": state.store.delete(&key) }))
}

fn handle_subject_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let key = match term_key(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let classes: Vec<serde_json::Value> = state
        .store
        .open(&key)
        .subject_load()
        .into_iter()
        .map(|(name, load)| {
            let subjects: Vec<serde_json::Value> = load
                .into_iter()
                .map(|(subject, periods)| json!({ "subject": subject, "periods": periods }))
                .collect();
            json!({ "name": name, "subjects": subjects })
        })
        .collect();
    ok(&req.id, json!({ "classes": classes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetables.list" => Some(handle_list(state, req)),
        "timetables.open" => Some(handle_open(state, req)),
        "timetables.day" => Some(handle_day(state, req)),
        "timetables.canAssign" => Some(handle_can_assign(state, req)),
        "timetables.edit" => Some(handle_edit(state, req)),
        "timetables.addPeriod" => Some(handle_add_period(state, req)),
        "timetables.deletePeriod" => Some(handle_delete_period(state, req)),
        "timetables.reset" => Some(handle_reset(state, req)),
        "timetables.delete" => Some(handle_delete(state, req)),
        "timetables.subjectLoad" => Some(handle_subject_load(state, req)),
        _ => None,
    }
}
