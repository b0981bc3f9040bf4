mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("timetabled-router-smoke");
    let export_out = workspace.join("smoke-export.json");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let key = |extra: serde_json::Value| {
        let mut params = json!({ "term": "Term 1", "year": 2025 });
        if let (Some(base), Some(more)) = (params.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                base.insert(k.clone(), v.clone());
            }
        }
        params
    };

    let calls = vec![
        ("health", json!({})),
        ("setup.get", json!({})),
        ("roster.addClass", json!({ "name": "Smoke Class" })),
        ("roster.setSubjects", json!({ "subjects": ["Mathematics"] })),
        ("roster.get", json!({})),
        ("timetables.open", key(json!({}))),
        ("timetables.list", json!({})),
        ("timetables.day", key(json!({ "day": "Friday" }))),
        (
            "timetables.canAssign",
            key(json!({ "class": "Smoke Class", "day": "Friday", "slotId": "period-1", "subject": "Mathematics" })),
        ),
        (
            "timetables.edit",
            key(json!({ "class": "Smoke Class", "day": "Friday", "slotId": "period-1", "subject": "Mathematics" })),
        ),
        ("timetables.addPeriod", key(json!({}))),
        ("timetables.deletePeriod", key(json!({ "slotId": "period-9" }))),
        ("timetables.subjectLoad", key(json!({}))),
        ("timetables.export", key(json!({ "outPath": export_out.to_string_lossy() }))),
        ("timetables.reset", key(json!({}))),
        ("timetables.delete", key(json!({}))),
        ("roster.removeClass", json!({ "name": "Smoke Class" })),
        ("setup.update", json!({ "patch": { "breakMinutes": 15 } })),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let resp = request(&mut stdin, &mut reader, &(i + 1).to_string(), method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let unknown = request(&mut stdin, &mut reader, "u", "grades.list", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json reply");
    let v: serde_json::Value = serde_json::from_str(line.trim()).expect("json reply");
    assert_eq!(v["error"]["code"], "bad_json");

    let after = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(after.get("ok").and_then(|v| v.as_bool()), Some(true));
}
