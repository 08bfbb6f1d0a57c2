mod test_support;

use serde_json::json;
use std::fs::File;
use std::io::Read;
use test_support::{open_workbook, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn bundle_round_trip_restores_the_roster() {
    let workbook = temp_dir("rollbook-bundle-src");
    let restore_dir = temp_dir("rollbook-bundle-dst");
    let out_dir = temp_dir("rollbook-bundle-out");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workbook(&mut stdin, &mut reader, &workbook);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.upsert",
        json!({ "record": { "name": "Wei Ming", "class": "1A", "mykid": "090402" } }),
    );

    let bundle_path = out_dir.join("rollbook.backup.zip");
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.exportWorkbookBundle",
        json!({
            "workbookPath": workbook.to_string_lossy(),
            "outPath": bundle_path.to_string_lossy()
        }),
    );
    assert_eq!(exported["bundleFormat"], "rollbook-workbook-v1");
    assert_eq!(exported["entryCount"], 3);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("read zip");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains("rollbook-workbook-v1"));
    assert!(manifest.contains("dbSha256"));
    archive
        .by_name("workbook/rollbook.sqlite3")
        .expect("database entry");

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.importWorkbookBundle",
        json!({
            "workbookPath": restore_dir.to_string_lossy(),
            "inPath": bundle_path.to_string_lossy()
        }),
    );
    assert_eq!(imported["digestVerified"], true);

    // The restored workbook serves the same roster.
    open_workbook(&mut stdin, &mut reader, &restore_dir);
    let listed = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["students"][0]["mykid"], "090402");

    let _ = std::fs::remove_dir_all(workbook);
    let _ = std::fs::remove_dir_all(restore_dir);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn restoring_over_the_open_workbook_refreshes_the_session() {
    let workbook = temp_dir("rollbook-bundle-live");
    let out_dir = temp_dir("rollbook-bundle-live-out");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workbook(&mut stdin, &mut reader, &workbook);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.upsert",
        json!({ "record": { "name": "Only Before", "class": "1A", "mykid": "001" } }),
    );
    let bundle_path = out_dir.join("before.zip");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.exportWorkbookBundle",
        json!({
            "workbookPath": workbook.to_string_lossy(),
            "outPath": bundle_path.to_string_lossy()
        }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.upsert",
        json!({ "record": { "name": "After Snapshot", "class": "1B", "mykid": "002" } }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.importWorkbookBundle",
        json!({
            "workbookPath": workbook.to_string_lossy(),
            "inPath": bundle_path.to_string_lossy()
        }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["students"][0]["name"], "Only Before");

    let _ = std::fs::remove_dir_all(workbook);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn foreign_archives_are_refused() {
    let workbook = temp_dir("rollbook-bundle-foreign");
    let out_dir = temp_dir("rollbook-bundle-foreign-out");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let alien = out_dir.join("alien.zip");
    std::fs::write(&alien, b"not a zip at all").expect("write alien file");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "backup.importWorkbookBundle",
        json!({
            "workbookPath": workbook.to_string_lossy(),
            "inPath": alien.to_string_lossy()
        }),
    );
    assert_eq!(code, "backup_failed");

    let _ = std::fs::remove_dir_all(workbook);
    let _ = std::fs::remove_dir_all(out_dir);
}
