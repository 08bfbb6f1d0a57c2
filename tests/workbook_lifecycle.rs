mod test_support;

use serde_json::json;
use test_support::{request, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn health_reports_version_and_open_workbook() {
    let workbook = temp_dir("rollbook-lifecycle-health");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let before = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(before["workbookPath"].is_null());
    assert!(before["version"].as_str().map(|s| !s.is_empty()).unwrap_or(false));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workbook.open",
        json!({ "path": workbook.to_string_lossy() }),
    );
    let after = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(
        after["workbookPath"].as_str(),
        Some(workbook.to_string_lossy().as_ref())
    );

    let _ = std::fs::remove_dir_all(workbook);
}

#[test]
fn every_data_method_requires_an_open_workbook() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    for (i, (method, params)) in [
        ("students.list", json!({})),
        ("students.search", json!({ "term": "x" })),
        ("attendance.list", json!({})),
        ("income.list", json!({})),
        ("export.bulkProfiles", json!({ "outPath": "/tmp/never.zip" })),
    ]
    .iter()
    .enumerate()
    {
        let code = request_err(&mut stdin, &mut reader, &format!("{}", i), method, params.clone());
        assert_eq!(code, "no_workbook", "method {}", method);
    }
}

#[test]
fn unknown_methods_answer_not_implemented() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err(&mut stdin, &mut reader, "1", "students.delete", json!({}));
    assert_eq!(code, "not_implemented");
}

#[test]
fn a_tampered_header_fails_the_open_loudly() {
    let workbook = temp_dir("rollbook-lifecycle-header");
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workbook.open",
            json!({ "path": workbook.to_string_lossy() }),
        );
    }

    // Drift the students header the way a hand-edited sheet would.
    let conn = rusqlite::Connection::open(workbook.join("rollbook.sqlite3")).expect("open db");
    conn.execute(
        "UPDATE sheet_rows SET cells = ? WHERE sheet = 'students' AND row_pos = 1",
        [r#"["name","klass","mykid","gender","guardian_phone"]"#],
    )
    .expect("tamper header");
    drop(conn);

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "workbook.open",
        json!({ "path": workbook.to_string_lossy() }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "store_open_failed");
    assert_eq!(resp["error"]["details"]["sheet"], "students");

    // And the session holds no workbook afterwards.
    let code = request_err(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(code, "no_workbook");

    let _ = std::fs::remove_dir_all(workbook);
}
