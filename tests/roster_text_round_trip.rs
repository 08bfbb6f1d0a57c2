mod test_support;

use serde_json::json;
use test_support::{open_workbook, request_ok, spawn_sidecar, temp_dir};

#[test]
fn leading_zero_keys_survive_a_full_round_trip() {
    let workbook = temp_dir("rollbook-roundtrip-zeros");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workbook(&mut stdin, &mut reader, &workbook);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.upsert",
        json!({ "record": {
            "name": "Wei Ming",
            "class": "1A",
            "mykid": "0012345",
            "guardian_phone": "0123456789"
        } }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(listed["students"][0]["mykid"], "0012345");
    assert_eq!(listed["students"][0]["guardian_phone"], "0123456789");

    let _ = std::fs::remove_dir_all(workbook);
}

#[test]
fn round_trip_survives_a_daemon_restart() {
    let workbook = temp_dir("rollbook-roundtrip-restart");
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        open_workbook(&mut stdin, &mut reader, &workbook);
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "students.upsert",
            json!({ "record": { "name": "Aisyah", "class": "2C", "mykid": "110203-10-0042" } }),
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workbook(&mut stdin, &mut reader, &workbook);
    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["students"][0]["mykid"], "110203-10-0042");
    assert_eq!(listed["students"][0]["class"], "2C");

    let _ = std::fs::remove_dir_all(workbook);
}

#[test]
fn long_digit_income_text_is_never_reformatted() {
    let workbook = temp_dir("rollbook-roundtrip-income");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_workbook(&mut stdin, &mut reader, &workbook);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "income.upsert",
        json!({ "record": {
            "mykid": "0012345",
            "student_name": "Wei Ming",
            "guardian_name": "Mei Ling",
            "monthly_income_rm": "03500.00"
        } }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "2", "income.list", json!({}));
    assert_eq!(listed["records"][0]["monthly_income_rm"], "03500.00");

    let _ = std::fs::remove_dir_all(workbook);
}
