mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("iqacd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["version"].is_string());
    assert!(health["unitsPath"].is_null());

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(selected["unitsPath"]
        .as_str()
        .unwrap_or_default()
        .ends_with("school_department_mapping_cleaned.csv"));

    for (i, method) in [
        "registry.load",
        "registry.edit",
        "registry.export",
        "planner.options",
        "planner.load",
        "planner.edit",
        "planner.export",
        "progress.view",
    ]
    .iter()
    .enumerate()
    {
        let _ = request_ok(&mut stdin, &mut reader, &format!("m{}", i), method, json!({}));
    }

    let unknown = request(&mut stdin, &mut reader, "3", "grades.compute", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let missing_rows = request(&mut stdin, &mut reader, "4", "registry.save", json!({}));
    assert_eq!(error_code(&missing_rows), Some("bad_params"));

    writeln!(stdin, "not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(error_code(&value), Some("bad_json"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
